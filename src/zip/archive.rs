// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ZIP archive reader (§4.3 C3), grounded in `ziparchive.c`.
//!
//! A codadef is distributed as a ZIP of XML definition files. Only the two
//! compression methods the original tool ever writes are accepted: stored
//! (0) and deflated (8). Every read cross-checks the local file header
//! against the central directory record it came from.

use std::collections::HashMap;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use crate::bitio::ByteSource;
use crate::core::{CodaError, Result};
use crate::zip::inflate::inflate_raw;

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const EOCD_SIZE: u64 = 22;

/// One entry from a ZIP archive's central directory.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    name: String,
    local_header_offset: u64,
    compression: u16,
    modification_time: u16,
    modification_date: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
}

impl ZipEntry {
    /// Entry name as stored in the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes.
    pub fn size(&self) -> u32 {
        self.uncompressed_size
    }
}

/// A ZIP archive opened for reading, its central directory parsed up front.
pub struct ZipArchive {
    source: Arc<dyn ByteSource>,
    entries: Vec<ZipEntry>,
    index_by_name: HashMap<String, usize>,
}

impl ZipArchive {
    /// Open `source` as a ZIP archive and parse its central directory.
    pub fn open(source: Arc<dyn ByteSource>) -> Result<Self> {
        let file_size = source.size();
        if file_size < EOCD_SIZE {
            return Err(CodaError::invalid_format("file is too small to be a zip archive"));
        }

        let mut signature_probe = [0u8; 2];
        source.read_at(0, &mut signature_probe)?;
        if &signature_probe != b"PK" {
            return Err(CodaError::invalid_format("not a zip archive (missing 'PK' signature)"));
        }

        let mut eocd = [0u8; EOCD_SIZE as usize];
        source.read_at(file_size - EOCD_SIZE, &mut eocd)?;

        if LittleEndian::read_u32(&eocd[0..4]) != EOCD_SIGNATURE {
            return Err(CodaError::invalid_format(
                "could not locate zip central directory (archive may have a trailing comment)",
            ));
        }
        let num_entries = LittleEndian::read_u16(&eocd[8..10]) as usize;
        let central_directory_offset = LittleEndian::read_u32(&eocd[16..20]) as u64;

        let mut entries = Vec::with_capacity(num_entries);
        let mut index_by_name = HashMap::with_capacity(num_entries);
        let mut offset = central_directory_offset;

        for _ in 0..num_entries {
            let mut header = [0u8; 46];
            source.read_at(offset, &mut header)?;
            offset += 46;

            if LittleEndian::read_u32(&header[0..4]) != CENTRAL_DIRECTORY_SIGNATURE {
                return Err(CodaError::invalid_format(
                    "invalid central directory file header signature in zip file",
                ));
            }

            let compression = LittleEndian::read_u16(&header[10..12]);
            if compression != 0 && compression != 8 {
                return Err(CodaError::unsupported(format!(
                    "unsupported zip compression method {compression}"
                )));
            }
            let modification_time = LittleEndian::read_u16(&header[12..14]);
            let modification_date = LittleEndian::read_u16(&header[14..16]);
            let crc32 = LittleEndian::read_u32(&header[16..20]);
            let compressed_size = LittleEndian::read_u32(&header[20..24]);
            let uncompressed_size = LittleEndian::read_u32(&header[24..28]);
            let filename_length = LittleEndian::read_u16(&header[28..30]) as u64;
            let extrafield_length = LittleEndian::read_u16(&header[30..32]) as u64;
            let comment_length = LittleEndian::read_u16(&header[32..34]) as u64;
            let local_header_offset = LittleEndian::read_u32(&header[42..46]) as u64;

            let mut name_buf = vec![0u8; filename_length as usize];
            source.read_at(offset, &mut name_buf)?;
            offset += filename_length + extrafield_length + comment_length;

            let name = String::from_utf8(name_buf)
                .map_err(|_| CodaError::invalid_format("zip entry name is not valid utf-8"))?;

            if local_header_offset > file_size {
                return Err(CodaError::invalid_format(
                    "invalid zip file (local header offset exceeds file size)",
                ));
            }
            if compression != 0 {
                if local_header_offset + compressed_size as u64 > file_size {
                    return Err(CodaError::invalid_format("invalid zip file (entry size exceeds file size)"));
                }
                // The theoretical maximum deflate compression factor is 1032.
                if uncompressed_size as u64 / 1032 > compressed_size as u64 + 1 {
                    return Err(CodaError::invalid_format("invalid uncompressed size in zip file"));
                }
            } else {
                if compressed_size != uncompressed_size {
                    return Err(CodaError::invalid_format(
                        "compressed and uncompressed sizes should be equal for a stored zip entry",
                    ));
                }
                if local_header_offset + uncompressed_size as u64 > file_size {
                    return Err(CodaError::invalid_format("invalid zip file (entry size exceeds file size)"));
                }
            }

            if index_by_name.insert(name.clone(), entries.len()).is_some() {
                return Err(CodaError::invalid_format(format!(
                    "zip file contains two entries with the same name '{name}'"
                )));
            }

            entries.push(ZipEntry {
                name,
                local_header_offset,
                compression,
                modification_time,
                modification_date,
                crc32,
                compressed_size,
                uncompressed_size,
            });
        }

        Ok(ZipArchive {
            source,
            entries,
            index_by_name,
        })
    }

    /// Number of entries in the archive.
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    /// All entries, in central-directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Look up an entry by index.
    pub fn entry(&self, index: usize) -> Option<&ZipEntry> {
        self.entries.get(index)
    }

    /// Look up an entry by name.
    pub fn entry_by_name(&self, name: &str) -> Option<&ZipEntry> {
        self.index_by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Read and decompress the contents of `entry`, re-verifying its local
    /// file header against the central directory record it came from.
    pub fn read_entry(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let mut header = [0u8; 30];
        self.source.read_at(entry.local_header_offset, &mut header)?;

        if LittleEndian::read_u32(&header[0..4]) != LOCAL_HEADER_SIGNATURE {
            return Err(CodaError::invalid_format("local file header has incorrect signature"));
        }
        let compression = LittleEndian::read_u16(&header[8..10]);
        if compression != entry.compression {
            return Err(mismatch("compression"));
        }
        if LittleEndian::read_u16(&header[10..12]) != entry.modification_time {
            return Err(mismatch("modification_time"));
        }
        if LittleEndian::read_u16(&header[12..14]) != entry.modification_date {
            return Err(mismatch("modification_date"));
        }
        if LittleEndian::read_u32(&header[14..18]) != entry.crc32 {
            return Err(mismatch("crc"));
        }
        if LittleEndian::read_u32(&header[18..22]) != entry.compressed_size {
            return Err(mismatch("compressed_size"));
        }
        if LittleEndian::read_u32(&header[22..26]) != entry.uncompressed_size {
            return Err(mismatch("uncompressed_size"));
        }
        let filename_length = LittleEndian::read_u16(&header[26..28]) as u64;
        if filename_length != entry.name.len() as u64 {
            return Err(mismatch("filename_length"));
        }
        let extrafield_length = LittleEndian::read_u16(&header[28..30]) as u64;

        let data_offset = entry.local_header_offset + 30 + filename_length + extrafield_length;

        if entry.compression == 0 {
            let mut out = vec![0u8; entry.uncompressed_size as usize];
            self.source.read_at(data_offset, &mut out)?;
            Ok(out)
        } else {
            let mut compressed = vec![0u8; entry.compressed_size as usize];
            self.source.read_at(data_offset, &mut compressed)?;
            inflate_raw(&compressed, entry.uncompressed_size as usize)
        }
    }

    /// Read and decompress an entry by name.
    pub fn read_entry_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry_by_name(name)
            .ok_or_else(|| CodaError::invalid_argument(format!("no such zip entry: '{name}'")))?
            .clone();
        self.read_entry(&entry)
    }
}

fn mismatch(field: &str) -> CodaError {
    CodaError::invalid_format(format!(
        "inconsistency between local file header and central directory ({field})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;
    use std::io::Write;

    fn build_minimal_zip(name: &str, contents: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();

        let local_header_offset = 0u32;
        buf.extend_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // compression: stored
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        let crc = crc32(contents);
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes()); // compressed size
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes()); // uncompressed size
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
        buf.write_all(name.as_bytes()).unwrap();
        buf.write_all(contents).unwrap();

        let central_directory_offset = buf.len() as u32;
        buf.extend_from_slice(&CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes()); // version made by
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // compression
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&crc.to_le_bytes());
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment length
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        buf.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
        buf.extend_from_slice(&0u32.to_le_bytes()); // external attributes
        buf.extend_from_slice(&local_header_offset.to_le_bytes());
        buf.write_all(name.as_bytes()).unwrap();

        let eocd_offset = buf.len() as u32;
        buf.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk number
        buf.extend_from_slice(&0u16.to_le_bytes()); // disk with central directory
        buf.extend_from_slice(&1u16.to_le_bytes()); // entries on this disk
        buf.extend_from_slice(&1u16.to_le_bytes()); // total entries
        buf.extend_from_slice(&(eocd_offset - central_directory_offset).to_le_bytes());
        buf.extend_from_slice(&central_directory_offset.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // comment length

        buf
    }

    fn crc32(data: &[u8]) -> u32 {
        // Minimal CRC-32 (IEEE 802.3) implementation for test fixtures only;
        // the stored-method decode path never validates CRC itself.
        let mut crc: u32 = 0xFFFF_FFFF;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    #[test]
    fn opens_and_reads_stored_entry() {
        let data = build_minimal_zip("defs/a.xml", b"<product/>");
        let src = Arc::new(MemorySource::new(data));
        let archive = ZipArchive::open(src).unwrap();
        assert_eq!(archive.num_entries(), 1);

        let entry = archive.entry_by_name("defs/a.xml").unwrap();
        assert_eq!(entry.size(), 10);

        let contents = archive.read_entry(entry).unwrap();
        assert_eq!(contents, b"<product/>");
    }

    #[test]
    fn rejects_non_zip_file() {
        let src = Arc::new(MemorySource::new(vec![0u8; 30]));
        assert!(ZipArchive::open(src).is_err());
    }

    #[test]
    fn rejects_too_small_file() {
        let src = Arc::new(MemorySource::new(vec![0u8; 4]));
        assert!(ZipArchive::open(src).is_err());
    }
}
