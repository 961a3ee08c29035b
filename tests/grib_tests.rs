// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of the GRIB1 backend against a hand-built,
//! minimal lat/lon-grid message: a 2-element simple-packed values array.

use coda::core::Format;
use coda::Product;

fn be24(v: u32) -> [u8; 3] {
    let b = v.to_be_bytes();
    [b[1], b[2], b[3]]
}

fn grib1_fixture() -> Vec<u8> {
    let mut pds = vec![0u8; 28];
    pds[0..3].copy_from_slice(&be24(28)); // section size
    pds[7] = 0x80; // has_gds, no BMS
    // decimalScaleFactor stays 0

    let mut gds = vec![0u8; 32];
    gds[0..3].copy_from_slice(&be24(32)); // section size
    gds[3] = 0; // nv
    gds[4] = 255; // pvl (no "list of numbers")
    gds[5] = 0; // data representation type: lat/lon, non-Gaussian
    gds[6..8].copy_from_slice(&2u16.to_be_bytes()); // Ni
    gds[8..10].copy_from_slice(&1u16.to_be_bytes()); // Nj
    // remaining grid fields (corner coordinates, increments, scanning mode) stay 0

    let values: [u8; 2] = [10, 20];
    let mut bds = vec![0u8; 11];
    bds[0..3].copy_from_slice(&be24(11 + values.len() as u32)); // section size
    bds[3] = 0; // flags: simple packing
                // binary_scale_factor stays 0
                // reference_value (IBM float) stays 0.0
    bds[10] = 8; // bits per value

    let body_len = pds.len() + gds.len() + bds.len() + values.len() + 4;
    let message_size = 8 + body_len as u32;

    let mut message = Vec::new();
    message.extend_from_slice(b"GRIB");
    message.extend_from_slice(&be24(message_size));
    message.push(1); // edition 1
    message.extend_from_slice(&pds);
    message.extend_from_slice(&gds);
    message.extend_from_slice(&bds);
    message.extend_from_slice(&values);
    message.extend_from_slice(b"7777");
    message
}

#[test]
fn reads_simple_packed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.grib");
    std::fs::write(&path, grib1_fixture()).unwrap();

    let product = Product::open(&path).unwrap();
    assert_eq!(product.format(), Format::Grib);

    let mut cursor = product.cursor();
    cursor.goto("/0/grib1/values[0]").unwrap();
    assert_eq!(cursor.read_double().unwrap(), 10.0);
    cursor.goto_parent().unwrap();

    cursor.goto_array_element_by_index(1).unwrap();
    assert_eq!(cursor.read_double().unwrap(), 20.0);
}

#[test]
fn recognizes_file_as_grib() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.grib");
    std::fs::write(&path, grib1_fixture()).unwrap();

    let recognized = Product::recognize_file(&path).unwrap();
    assert_eq!(recognized.format, Format::Grib);
}
