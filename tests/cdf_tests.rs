// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of the CDF backend against a hand-built product:
//! one scalar zVariable with a variable-scope attribute, and one
//! record-varying zVariable stored compressed (gzip, via a CVVR record).

use std::io::Write as _;

use coda::core::Format;
use coda::Product;

/// Appends CDF record fields to a growing buffer, tracking byte positions
/// so forward pointers (every CDF pointer field points to a record that
/// hasn't been written yet) can be patched in after the fact.
struct Builder {
    buf: Vec<u8>,
}

impl Builder {
    fn new() -> Self {
        Builder { buf: Vec::new() }
    }

    fn pos(&self) -> i64 {
        self.buf.len() as i64
    }

    fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    fn name(&mut self, s: &str, len: usize) {
        let mut bytes = s.as_bytes().to_vec();
        bytes.resize(len, b' ');
        self.buf.extend_from_slice(&bytes);
    }

    fn record_header(&mut self, record_type: i32) -> i64 {
        let start = self.pos();
        self.i64(0); // record size, never consulted by the reader
        self.i32(record_type);
        start
    }

    fn patch_i64(&mut self, at: i64, v: i64) {
        let at = at as usize;
        self.buf[at..at + 8].copy_from_slice(&v.to_be_bytes());
    }
}

fn gzip(payload: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

fn build_fixture() -> Vec<u8> {
    let mut b = Builder::new();
    b.raw(&0xCDF3_0001u32.to_be_bytes());
    b.raw(&0x0000_FFFFu32.to_be_bytes());

    // CDR
    b.record_header(1);
    let gdr_ptr = b.pos();
    b.i64(0); // gdr_offset @ +12
    b.zeros(4); // filler @ +20
    b.i32(2); // encoding @ +24 (big-endian)
    b.zeros(4); // filler @ +28
    b.i32(0); // flags @ +32 (row-major / C ordering)

    // GDR
    let gdr_start = b.pos();
    b.patch_i64(gdr_ptr, gdr_start);
    b.record_header(2);
    b.i64(0); // rvdr_head @ +12 (no rVariables)
    let zvdr_ptr = b.pos();
    b.i64(0); // zvdr_head @ +20
    let adr_ptr = b.pos();
    b.i64(0); // adr_head @ +28
    let eof_ptr = b.pos();
    b.i64(0); // eof @ +36
    b.i32(0); // rnum_dims @ +44

    // ZVDR #0 "Temperature" (scalar, not record-varying)
    let zvdr0_start = b.pos();
    b.patch_i64(zvdr_ptr, zvdr0_start);
    b.record_header(8);
    let zvdr0_next_ptr = b.pos();
    b.i64(0); // vdr_next @ +12
    b.i32(4); // data_type @ +20 (INT4)
    b.i32(0); // max_rec @ +24
    let vxr0_ptr = b.pos();
    b.i64(0); // vxr_head @ +28
    b.zeros(8); // filler @ +36..+44
    b.i32(0); // flags @ +44 (not record-varying, not compressed)
    b.i32(0); // srecords @ +48
    b.zeros(12); // filler @ +52..+64
    b.i32(1); // num_elems @ +64
    b.i32(0); // num @ +68 (variable index 0)
    b.i64(0); // cpr_spr_offset @ +72 (uncompressed)
    b.zeros(4); // filler @ +80..+84
    b.name("Temperature", 256); // @ +84..+340
    b.i32(0); // num_dims @ +340

    // VXR #0
    let vxr0_start = b.pos();
    b.patch_i64(vxr0_ptr, vxr0_start);
    b.record_header(6);
    b.i64(0); // vxr_next @ +12
    b.i32(1); // n_entries @ +20
    b.i32(1); // nused_entries @ +24
    b.i32(0); // vr_first[0] @ +28
    b.i32(0); // vr_last[0] @ +32
    let vr0_ptr = b.pos();
    b.i64(0); // vr_offset[0] @ +36

    // VVR #0: the scalar value itself, 42
    let vvr0_start = b.pos();
    b.patch_i64(vr0_ptr, vvr0_start);
    b.record_header(7);
    b.i32(42); // value @ +12

    // ZVDR #1 "Values" (record-varying, compressed array of 3 records)
    let zvdr1_start = b.pos();
    b.patch_i64(zvdr0_next_ptr, zvdr1_start);
    b.record_header(8);
    b.i64(0); // vdr_next @ +12 (last variable)
    b.i32(4); // data_type @ +20 (INT4)
    b.i32(2); // max_rec @ +24 (3 records: 0..=2)
    let vxr1_ptr = b.pos();
    b.i64(0); // vxr_head @ +28
    b.zeros(8); // filler @ +36..+44
    b.i32(0b101); // flags @ +44 (record-varying | compressed)
    b.i32(0); // srecords @ +48
    b.zeros(12); // filler @ +52..+64
    b.i32(1); // num_elems @ +64
    b.i32(1); // num @ +68 (variable index 1)
    let cpr_ptr = b.pos();
    b.i64(0); // cpr_spr_offset @ +72
    b.zeros(4); // filler @ +80..+84
    b.name("Values", 256); // @ +84..+340
    b.i32(0); // num_dims @ +340 (no spatial dims, only the record dimension)

    // VXR #1
    let vxr1_start = b.pos();
    b.patch_i64(vxr1_ptr, vxr1_start);
    b.record_header(6);
    b.i64(0); // vxr_next @ +12
    b.i32(1); // n_entries @ +20
    b.i32(1); // nused_entries @ +24
    b.i32(0); // vr_first[0] @ +28
    b.i32(2); // vr_last[0] @ +32 (covers records 0..=2)
    let vr1_ptr = b.pos();
    b.i64(0); // vr_offset[0] @ +36

    // CPR: gzip compression descriptor
    let cpr_start = b.pos();
    b.patch_i64(cpr_ptr, cpr_start);
    b.record_header(11);
    b.i32(5); // ctype @ +12 (gzip)

    // CVVR: compressed payload for the 3 "Values" records (10, 20, 30)
    let payload: Vec<u8> = [10i32, 20, 30].iter().flat_map(|v| v.to_be_bytes()).collect();
    let compressed = gzip(&payload);
    let cvvr_start = b.pos();
    b.patch_i64(vr1_ptr, cvvr_start);
    b.record_header(13);
    b.zeros(4); // filler @ +12..+16
    b.i64(compressed.len() as i64); // csize @ +16
    b.raw(&compressed); // compressed data @ +24

    // ADR: one variable-scope ("Units") attribute targeting "Temperature"
    let adr_start = b.pos();
    b.patch_i64(adr_ptr, adr_start);
    b.record_header(4);
    b.i64(0); // adr_next @ +12 (only one attribute)
    let aedr_ptr = b.pos();
    b.i64(0); // agredr_head @ +20
    b.i32(2); // scope @ +28 (VARIABLE_SCOPE, even)
    b.i32(0); // ngr_entries @ +32
    b.zeros(12); // filler @ +36..+48
    b.i64(0); // azedr_head @ +48 (unused for variable scope)
    b.i32(1); // nz_entries @ +56
    b.zeros(8); // filler @ +60..+68
    b.name("Units", 256); // @ +68..+324

    // AEDR (zEntry): "Units" value on variable 0 ("Temperature")
    let aedr_start = b.pos();
    b.patch_i64(aedr_ptr, aedr_start);
    b.record_header(9);
    b.i64(0); // aedr_next @ +12
    b.zeros(4); // filler @ +20..+24
    b.i32(4); // data_type @ +24 (INT4)
    b.i32(0); // num @ +28 (targets variable index 0)
    b.i32(1); // num_elems @ +32
    b.zeros(20); // filler @ +36..+56
    b.i32(-999); // value @ +56

    let eof = b.pos();
    b.patch_i64(eof_ptr, eof);

    b.buf
}

#[test]
fn reads_scalar_attribute_and_compressed_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.cdf");
    std::fs::write(&path, build_fixture()).unwrap();

    let product = Product::open(&path).unwrap();
    assert_eq!(product.format(), Format::Cdf);

    let mut cursor = product.cursor();
    cursor.goto("/Temperature").unwrap();
    assert_eq!(cursor.read_int64().unwrap(), 42);

    cursor.goto_attributes().unwrap();
    cursor.goto_record_field_by_name("Units").unwrap();
    assert_eq!(cursor.read_int64().unwrap(), -999);
    cursor.goto_parent().unwrap();
    cursor.goto_parent().unwrap();

    cursor.goto("/Values").unwrap();
    assert_eq!(cursor.get_num_elements().unwrap(), 3);
    for (index, expected) in [10i64, 20, 30].into_iter().enumerate() {
        cursor.goto_array_element_by_index(index as u64).unwrap();
        assert_eq!(cursor.read_int64().unwrap(), expected);
        cursor.goto_parent().unwrap();
    }
}
