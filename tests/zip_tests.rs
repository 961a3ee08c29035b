// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of the ZIP archive reader against a hand-built
//! stored-method archive (crc fields are left at 0: `read_entry` only
//! cross-checks the local header against the central directory, it never
//! recomputes a checksum over the payload).

use std::io::Write as _;
use std::sync::Arc;

use coda::bitio::MemorySource;
use coda::zip::ZipArchive;

fn build_stored_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut local_offsets = Vec::new();

    for (name, contents) in entries {
        local_offsets.push(buf.len() as u32);
        buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // compression: stored
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&0u32.to_le_bytes()); // crc32
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // extra field length
        buf.write_all(name.as_bytes()).unwrap();
        buf.write_all(contents).unwrap();
    }

    let central_directory_offset = buf.len() as u32;
    for ((name, contents), local_header_offset) in entries.iter().zip(&local_offsets) {
        buf.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        buf.extend_from_slice(&20u16.to_le_bytes()); // version made by
        buf.extend_from_slice(&20u16.to_le_bytes()); // version needed
        buf.extend_from_slice(&0u16.to_le_bytes()); // flags
        buf.extend_from_slice(&0u16.to_le_bytes()); // compression
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod time
        buf.extend_from_slice(&0u16.to_le_bytes()); // mod date
        buf.extend_from_slice(&0u32.to_le_bytes()); // crc32
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
    }

    let eocd_offset = buf.len() as u32;
    buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk number
    buf.extend_from_slice(&0u16.to_le_bytes()); // disk with central directory
    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    buf.extend_from_slice(&(eocd_offset - central_directory_offset).to_le_bytes());
    buf.extend_from_slice(&central_directory_offset.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // comment length

    buf
}

#[test]
fn reads_multiple_stored_entries_by_name() {
    let data = build_stored_zip(&[("a.xml", b"<a/>"), ("sub/b.xml", b"<b>text</b>")]);
    let archive = ZipArchive::open(Arc::new(MemorySource::new(data))).unwrap();
    assert_eq!(archive.num_entries(), 2);

    assert_eq!(archive.read_entry_by_name("a.xml").unwrap(), b"<a/>");
    assert_eq!(archive.read_entry_by_name("sub/b.xml").unwrap(), b"<b>text</b>");
    assert!(archive.entry_by_name("missing.xml").is_none());
}

#[test]
fn deflated_entry_round_trips() {
    let contents = b"repeated repeated repeated repeated data";
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(contents).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut buf = Vec::new();
    let name = "deflated.xml";
    buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&8u16.to_le_bytes()); // compression: deflate
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.write_all(name.as_bytes()).unwrap();
    buf.write_all(&compressed).unwrap();

    let central_directory_offset = buf.len() as u32;
    buf.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&8u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.write_all(name.as_bytes()).unwrap();

    let eocd_offset = buf.len() as u32;
    buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&(eocd_offset - central_directory_offset).to_le_bytes());
    buf.extend_from_slice(&central_directory_offset.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());

    let archive = ZipArchive::open(Arc::new(MemorySource::new(buf))).unwrap();
    assert_eq!(archive.read_entry_by_name(name).unwrap(), contents);
}
