// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! A [`ByteSource`] that appends an in-memory overflow region after a file.
//!
//! A gzip-compressed CDF variable value record (record type 13) cannot be
//! addressed by file offset once inflated - there is no file position for
//! bytes that only exist after decompression. Rather than giving the
//! dynamic-type tree a second kind of position, this composite source gives
//! decompressed bytes a position too: appended after the real file, so a
//! `FilePosition` computed once at open time stays valid for the life of the
//! cursor.

use std::sync::Arc;

use crate::bitio::ByteSource;
use crate::core::{CodaError, Result};

pub struct OverflowSource {
    file: Arc<dyn ByteSource>,
    overflow: Vec<u8>,
}

impl OverflowSource {
    pub fn new(file: Arc<dyn ByteSource>) -> Self {
        OverflowSource { file, overflow: Vec::new() }
    }

    /// Append `bytes` to the overflow region, returning the bit offset
    /// (relative to this composite source, not the underlying file) its
    /// first byte now occupies.
    pub fn append(&mut self, bytes: Vec<u8>) -> i64 {
        let byte_offset = self.file.size() + self.overflow.len() as u64;
        self.overflow.extend_from_slice(&bytes);
        (byte_offset * 8) as i64
    }
}

impl ByteSource for OverflowSource {
    fn size(&self) -> u64 {
        self.file.size() + self.overflow.len() as u64
    }

    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()> {
        let file_size = self.file.size();
        if offset >= file_size {
            let start = (offset - file_size) as usize;
            let end = start + dst.len();
            if end > self.overflow.len() {
                return Err(CodaError::OutOfBoundsRead {
                    offset: offset as i64,
                    length: dst.len() as i64,
                    source_size: self.size() as i64,
                });
            }
            dst.copy_from_slice(&self.overflow[start..end]);
            return Ok(());
        }
        if offset + dst.len() as u64 > file_size {
            return Err(CodaError::OutOfBoundsRead {
                offset: offset as i64,
                length: dst.len() as i64,
                source_size: self.size() as i64,
            });
        }
        self.file.read_at(offset, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;

    #[test]
    fn reads_from_file_region_untouched() {
        let file: Arc<dyn ByteSource> = Arc::new(MemorySource::new(vec![1, 2, 3, 4]));
        let source = OverflowSource::new(file);
        let mut dst = [0u8; 2];
        source.read_at(1, &mut dst).unwrap();
        assert_eq!(dst, [2, 3]);
    }

    #[test]
    fn appended_bytes_are_addressable_past_file_size() {
        let file: Arc<dyn ByteSource> = Arc::new(MemorySource::new(vec![1, 2, 3, 4]));
        let mut source = OverflowSource::new(file);
        let bit_offset = source.append(vec![9, 9, 7]);
        assert_eq!(bit_offset, 32);
        let mut dst = [0u8; 3];
        source.read_at(4, &mut dst).unwrap();
        assert_eq!(dst, [9, 9, 7]);
    }
}
