// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte source abstraction (§9: "a single `read(offset, len, dst)` contract
//! is enough for all backends").
//!
//! Memory-mapping is an optimization, not a different contract: [`FileSource`]
//! tries `mmap` first when [`Options::use_mmap`](crate::core::Options) is
//! set and falls back to positional reads if the mapping fails (a network
//! filesystem that refuses `mmap`, a pipe, etc).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::core::{CodaError, Result};

/// A seekable byte source supporting positional reads, analogous to
/// POSIX `pread`.
pub trait ByteSource: Send + Sync {
    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Read exactly `dst.len()` bytes starting at `offset`.
    ///
    /// Fails with [`CodaError::OutOfBoundsRead`] if `offset + dst.len()`
    /// exceeds [`ByteSource::size`], or [`CodaError::FileRead`] on I/O error.
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()>;
}

enum Backing {
    Mapped(memmap2::Mmap),
    Positional(std::sync::Mutex<File>),
}

/// A [`ByteSource`] backed by an on-disk file.
pub struct FileSource {
    path: String,
    size: u64,
    backing: Backing,
}

impl FileSource {
    /// Open `path` as a byte source. Tries `mmap` when `use_mmap` is set,
    /// falling back to buffered positional reads on any mapping failure.
    pub fn open(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.display().to_string();
        let file = File::open(path_ref).map_err(|e| CodaError::FileOpen {
            path: path_str.clone(),
            message: e.to_string(),
        })?;
        let size = file
            .metadata()
            .map_err(|e| CodaError::FileOpen {
                path: path_str.clone(),
                message: e.to_string(),
            })?
            .len();

        let backing = if use_mmap {
            // SAFETY: the file is not expected to be truncated/resized by
            // another process while open; this mirrors the same trust
            // assumption the C library makes about mmap'd product files.
            match unsafe { memmap2::Mmap::map(&file) } {
                Ok(map) => Backing::Mapped(map),
                Err(_) => Backing::Positional(std::sync::Mutex::new(file)),
            }
        } else {
            Backing::Positional(std::sync::Mutex::new(file))
        };

        Ok(FileSource {
            path: path_str,
            size,
            backing,
        })
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()> {
        let len = dst.len() as u64;
        if offset.checked_add(len).map_or(true, |end| end > self.size) {
            return Err(CodaError::OutOfBoundsRead {
                offset: offset as i64,
                length: len as i64,
                source_size: self.size as i64,
            });
        }
        match &self.backing {
            Backing::Mapped(map) => {
                dst.copy_from_slice(&map[offset as usize..offset as usize + dst.len()]);
                Ok(())
            }
            Backing::Positional(file) => {
                let mut file = file.lock().map_err(|_| {
                    CodaError::Other("file source lock poisoned".to_string())
                })?;
                file.seek(SeekFrom::Start(offset))
                    .map_err(|e| CodaError::FileRead {
                        path: self.path.clone(),
                        message: e.to_string(),
                    })?;
                file.read_exact(dst).map_err(|e| CodaError::FileRead {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/// An in-memory [`ByteSource`], used by tests and by the ZIP/codadef loader
/// for inflated buffers.
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    /// Wrap an owned byte buffer as a source.
    pub fn new(data: Vec<u8>) -> Self {
        MemorySource { data }
    }
}

impl ByteSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()> {
        let start = offset as usize;
        let end = start + dst.len();
        if end > self.data.len() {
            return Err(CodaError::OutOfBoundsRead {
                offset: offset as i64,
                length: dst.len() as i64,
                source_size: self.data.len() as i64,
            });
        }
        dst.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reads_in_bounds() {
        let src = MemorySource::new(vec![1, 2, 3, 4, 5]);
        let mut dst = [0u8; 3];
        src.read_at(1, &mut dst).unwrap();
        assert_eq!(dst, [2, 3, 4]);
    }

    #[test]
    fn memory_source_rejects_out_of_bounds() {
        let src = MemorySource::new(vec![1, 2, 3]);
        let mut dst = [0u8; 2];
        assert!(matches!(
            src.read_at(2, &mut dst),
            Err(CodaError::OutOfBoundsRead { .. })
        ));
    }

    #[test]
    fn file_source_round_trips() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        tmp.write_all(b"hello world").unwrap();
        let src = FileSource::open(tmp.path(), false).unwrap();
        assert_eq!(src.size(), 11);
        let mut dst = [0u8; 5];
        src.read_at(6, &mut dst).unwrap();
        assert_eq!(&dst, b"world");
    }

    #[test]
    fn file_source_mmap_round_trips() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        tmp.write_all(b"hello world").unwrap();
        let src = FileSource::open(tmp.path(), true).unwrap();
        let mut dst = [0u8; 5];
        src.read_at(0, &mut dst).unwrap();
        assert_eq!(&dst, b"hello");
    }
}
