// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDF v3 backend (§4.9 C9).
//!
//! A CDF file is a singly-linked chain of fixed-format records: one CDR
//! (file-level descriptor), one GDR (global descriptor, heads of the
//! rVariable/zVariable/attribute chains), then one VDR per variable and one
//! ADR per attribute. [`open`] walks that chain once at product-open time
//! and builds the whole dynamic-type tree eagerly - unlike the lazily
//! evaluated bit-offset expressions the generic codadef-driven types use,
//! CDF's layout is fully determined by its own binary header, so there is
//! nothing to defer.

mod overflow;
mod records;
mod variable;

use std::sync::Arc;

use crate::bitio::ByteSource;
use crate::core::{ArrayOrdering, CodaError, Result};
use crate::dynamic::DynamicRef;

use records::{read_i32, read_i64, CDR, GDR};
use variable::ProductBuilder;

const V3_MAGIC_1: u32 = 0xCDF3_0001;
const V3_COMPRESSED_MAGIC_2: u32 = 0xCCCC_0001;
const V3_MAGIC_2: u32 = 0x0000_FFFF;

/// Check the 8-byte magic number CDF v3 files open with. Byte 5 (the low
/// byte of the second magic word) distinguishes an uncompressed file
/// (`0xFFFF`) from one whose whole record stream is itself compressed -
/// the latter wraps every record, not just variable values, and is not
/// supported by this backend (the reference library's own "single-file
/// whole-file compression" mode is rare and distinct from per-variable
/// VVR/CVVR compression, which is supported).
fn check_magic(source: &dyn ByteSource) -> Result<()> {
    let magic1 = records::read_u32(source, 0)?;
    let magic2 = records::read_u32(source, 4)?;
    if magic1 != V3_MAGIC_1 {
        return Err(CodaError::product("not a CDF file (unrecognized magic number)"));
    }
    if magic2 == V3_COMPRESSED_MAGIC_2 {
        return Err(CodaError::unsupported("whole-file compressed CDF is not supported"));
    }
    if magic2 != V3_MAGIC_2 {
        return Err(CodaError::product("not a CDF file (unrecognized magic number)"));
    }
    Ok(())
}

struct Cdr {
    gdr_offset: i64,
    little_endian: bool,
    array_ordering: ArrayOrdering,
}

fn read_cdr(source: &dyn ByteSource) -> Result<Cdr> {
    let off = 8u64; // the CDR always starts right after the 8-byte magic
    records::expect_record_type(source, off, CDR, "CDR")?;
    let gdr_offset = read_i64(source, off + 12)?;
    let encoding = read_i32(source, off + 24)?;
    let flags = read_i32(source, off + 32)?;

    // IBMPC (6) and MAC (8, little-endian 68k rarely seen in practice) mark
    // a little-endian file; everything else in the encoding enum
    // (NETWORK/SUN/VAX/DECSTATION variants the library still recognizes)
    // is big-endian on disk.
    let little_endian = matches!(encoding, 6 | 16);
    let array_ordering = if flags & 2 != 0 { ArrayOrdering::Fortran } else { ArrayOrdering::C };

    Ok(Cdr { gdr_offset, little_endian, array_ordering })
}

struct Gdr {
    rvdr_head: i64,
    zvdr_head: i64,
    adr_head: i64,
    rnum_dims: i32,
}

fn read_gdr(source: &dyn ByteSource, offset: i64) -> Result<Gdr> {
    let off = offset as u64;
    records::expect_record_type(source, off, GDR, "GDR")?;
    let rvdr_head = read_i64(source, off + 12)?;
    let zvdr_head = read_i64(source, off + 20)?;
    let adr_head = read_i64(source, off + 28)?;
    let eof = read_i64(source, off + 36)?;
    let rnum_dims = read_i32(source, off + 44)?;
    if eof as u64 > source.size() {
        return Err(CodaError::product("CDF file is truncated (eof field beyond end of file)"));
    }
    Ok(Gdr { rvdr_head, zvdr_head, adr_head, rnum_dims })
}

/// Open a CDF v3 product, returning the composite byte source a [`Cursor`]
/// (inflated variable records may live past the end of the real file) and
/// the product's root dynamic type.
///
/// [`Cursor`]: crate::cursor::Cursor
pub fn open(file: Arc<dyn ByteSource>) -> Result<(Arc<dyn ByteSource>, DynamicRef)> {
    check_magic(file.as_ref())?;
    let cdr = read_cdr(file.as_ref())?;
    let gdr = read_gdr(file.as_ref(), cdr.gdr_offset)?;

    let mut builder = ProductBuilder::new(file, cdr.little_endian, cdr.array_ordering, gdr.rnum_dims);
    builder.read_vdr_chain(gdr.rvdr_head, false)?;
    builder.read_vdr_chain(gdr.zvdr_head, true)?;
    builder.read_adr_chain(gdr.adr_head)?;

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;

    #[test]
    fn rejects_file_with_bad_magic() {
        let source = MemorySource::new(vec![0u8; 16]);
        assert!(check_magic(&source).is_err());
    }
}
