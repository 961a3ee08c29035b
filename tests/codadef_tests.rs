// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of loading a codadef ZIP archive into the process
//! global dictionary, including the revision replacement policy.
//!
//! Every test here uses a distinct class name: `global()` is a
//! single process-wide dictionary shared by every test in this binary.

use std::io::Write as _;
use std::sync::Arc;

use coda::bitio::MemorySource;
use coda::codadef::loader::{global, load_archive};
use coda::types::StaticType;

fn build_stored_zip(name: &str, contents: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // stored
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // crc32 (never recomputed by the reader)
    buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.write_all(name.as_bytes()).unwrap();
    buf.write_all(contents).unwrap();

    let central_directory_offset = buf.len() as u32;
    buf.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&20u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&(contents.len() as u32).to_le_bytes());
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

    buf
}

fn sample_xml(class_name: &str, revision: u64) -> String {
    format!(
        r#"
        <ProductClass name="{class_name}" revision="{revision}">
            <Description>an integration-test product class</Description>
            <ProductType name="Simple" format="binary">
                <ProductDefinition>
                    <Record>
                        <Field name="count">
                            <Integer><NativeType>int32</NativeType></Integer>
                        </Field>
                    </Record>
                </ProductDefinition>
                <DetectionRule>
                    <MatchFilename>{class_name}_*.bin</MatchFilename>
                </DetectionRule>
            </ProductType>
        </ProductClass>
        "#
    )
}

#[test]
fn loads_archive_and_registers_class() {
    let xml = sample_xml("CODADEF_TESTS_BASIC", 1);
    let zip = build_stored_zip("basic.xml", xml.as_bytes());
    let loaded = load_archive(Arc::new(MemorySource::new(zip))).unwrap();
    assert_eq!(loaded, 1);

    let class = global().class("CODADEF_TESTS_BASIC").unwrap().unwrap();
    assert_eq!(class.revision, 1);
    assert_eq!(class.description, "an integration-test product class");
    let product_type = class.product_types.get("Simple").unwrap();
    assert_eq!(product_type.detection_rules.len(), 1);
    assert!(matches!(product_type.root_type.as_ref(), StaticType::Record(_)));
}

#[test]
fn newer_revision_replaces_older_across_loads() {
    let name = "CODADEF_TESTS_REVISION";
    let first = build_stored_zip("rev1.xml", sample_xml(name, 1).as_bytes());
    let second = build_stored_zip("rev2.xml", sample_xml(name, 2).as_bytes());

    load_archive(Arc::new(MemorySource::new(first))).unwrap();
    assert_eq!(global().class(name).unwrap().unwrap().revision, 1);

    load_archive(Arc::new(MemorySource::new(second))).unwrap();
    assert_eq!(global().class(name).unwrap().unwrap().revision, 2);
}

#[test]
fn older_revision_is_ignored_not_an_error() {
    let name = "CODADEF_TESTS_REJECT_OLD";
    let newer = build_stored_zip("new.xml", sample_xml(name, 5).as_bytes());
    let older = build_stored_zip("old.xml", sample_xml(name, 1).as_bytes());

    load_archive(Arc::new(MemorySource::new(newer))).unwrap();
    let loaded = load_archive(Arc::new(MemorySource::new(older))).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(global().class(name).unwrap().unwrap().revision, 5);
}

#[test]
fn non_xml_archive_members_are_skipped() {
    let zip = build_stored_zip("README.txt", b"not a definition file");
    let loaded = load_archive(Arc::new(MemorySource::new(zip))).unwrap();
    assert_eq!(loaded, 0);
}
