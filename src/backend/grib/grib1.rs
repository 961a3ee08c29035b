// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GRIB edition 1 message parsing (§4.10 C10).
//!
//! A GRIB1 message is a fixed sequence of sections following the 8-byte
//! Indicator Section: Product Definition (PDS, always present), Grid
//! Definition (GDS, optional), Bit Map (BMS, optional), Binary Data (BDS),
//! then the 4-byte `"7777"` end marker. Only the latitude/longitude grid
//! family (and its Gaussian variants) is supported; spherical-harmonic and
//! second-order packed data, and grids carried only by a numeric
//! `gridDefinition` catalog entry rather than a GDS, are rejected as
//! unsupported rather than guessed at.

use std::sync::Arc;

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{CodaError, Result};
use crate::dynamic::{ArrayDynamic, DynamicRef, DynamicType, SimplePacking};
use crate::types::array::{ArrayType, Dimension};
use crate::types::number::{NumberClass, NumberType, ReadType};
use crate::types::{StaticType, TypeRef};

use super::packing::{ibm_float_to_f32, sign_magnitude};
use super::record::RecordBuilder;

/// `pds_offset` is the byte offset of the first byte of the Product
/// Definition Section, i.e. 8 bytes past the start of the message.
pub fn read_message(source: &dyn ByteSource, pds_offset: u64) -> Result<DynamicRef> {
    let mut offset = pds_offset;
    let mut out = RecordBuilder::new();
    out.u8("editionNumber", 1);

    let pds = read_bytes(source, offset, 28)?;
    let section_size = be24(&pds[0..3]) as u64;
    out.u8("table2Version", pds[3]);
    out.u8("centre", pds[4]);
    out.u8("generatingProcessIdentifier", pds[5]);
    out.u8("gridDefinition", pds[6]);
    let has_gds = pds[7] & 0x80 != 0;
    let has_bms = pds[7] & 0x40 != 0;
    out.u8("indicatorOfParameter", pds[8]);
    out.u8("indicatorOfTypeOfLevel", pds[9]);
    out.u16("level", be16(&pds[10..12]));
    out.u8("yearOfCentury", pds[12]);
    out.u8("month", pds[13]);
    out.u8("day", pds[14]);
    out.u8("hour", pds[15]);
    out.u8("minute", pds[16]);
    out.u8("unitOfTimeRange", pds[17]);
    out.u8("P1", pds[18]);
    out.u8("P2", pds[19]);
    out.u8("timeRangeIndicator", pds[20]);
    out.u16("numberIncludedInAverage", be16(&pds[21..23]));
    out.u8("numberMissingFromAveragesOrAccumulations", pds[23]);
    out.u8("centuryOfReferenceTimeOfData", pds[24]);
    out.u8("subCentre", pds[25]);
    let decimal_scale_factor = sign_magnitude(&pds[26..28]) as i32;
    out.i16("decimalScaleFactor", decimal_scale_factor);
    offset += section_size;

    let grid_definition = pds[6];
    let grid = if has_gds {
        read_gds(source, &mut offset)?
    } else {
        predefined_grid(grid_definition)?
    };

    let bitmask_bit_offset = if has_bms { Some(read_bms(source, &mut offset)?) } else { None };

    let (values_type, values) =
        read_bds(source, &mut offset, grid.num_elements, decimal_scale_factor, bitmask_bit_offset)?;
    out.field("grid", grid.static_type, grid.dynamic);
    out.field("values", values_type, values);

    let footer = read_bytes(source, offset, 4)?;
    if &footer != b"7777" {
        return Err(CodaError::product("GRIB1 message is missing its '7777' end section"));
    }

    Ok(out.finish()?.1)
}

fn be16(b: &[u8]) -> u16 {
    (b[0] as u16) * 256 + b[1] as u16
}

fn be24(b: &[u8]) -> u32 {
    ((b[0] as u32) * 256 + b[1] as u32) * 256 + b[2] as u32
}

struct Grid {
    static_type: TypeRef,
    dynamic: DynamicRef,
    num_elements: u64,
}

/// Lat/lon-family GDS (data representation types 0/4/10/14/20/24/30/34;
/// the 4/14/24/34 variants are Gaussian grids, where the last 26-byte word
/// is `N` rather than `jDirectionIncrement`).
fn read_gds(source: &dyn ByteSource, offset: &mut u64) -> Result<Grid> {
    let header = read_bytes(source, *offset, 6)?;
    let section_size = be24(&header[0..3]) as u64;
    let nv = header[3] as u64;
    let pvl = header[4] as u64;
    let data_representation_type = header[5];

    let is_gaussian = matches!(data_representation_type, 4 | 14 | 24 | 34);
    if !matches!(data_representation_type, 0 | 4 | 10 | 14 | 20 | 24 | 30 | 34) {
        return Err(CodaError::unsupported(format!(
            "unsupported data representation type ({data_representation_type}) in GDS"
        )));
    }

    let body = read_bytes(source, *offset + 6, 26)?;
    let ni = be16(&body[0..2]);
    let nj = be16(&body[2..4]);
    if ni == 0xFFFF || nj == 0xFFFF {
        return Err(CodaError::unsupported(
            "grid definition with MISSING value (65535) for Ni or Nj is not supported",
        ));
    }
    let num_elements = ni as u64 * nj as u64;

    let mut out = RecordBuilder::new();
    out.u16("Ni", ni);
    out.u16("Nj", nj);
    out.i32("latitudeOfFirstGridPoint", sign_magnitude(&body[4..7]));
    out.i32("longitudeOfFirstGridPoint", sign_magnitude(&body[7..10]));
    out.u8("resolutionAndComponentFlags", body[10]);
    out.i32("latitudeOfLastGridPoint", sign_magnitude(&body[11..14]));
    out.i32("longitudeOfLastGridPoint", sign_magnitude(&body[14..17]));
    out.u16("iDirectionIncrement", be16(&body[17..19]));
    if is_gaussian {
        out.u16("N", be16(&body[19..21]));
    } else {
        out.u16("jDirectionIncrement", be16(&body[19..21]));
    }
    out.u8("scanningMode", body[21]);

    *offset += 6 + 26;

    if pvl != 255 && section_size > pvl + nv * 4 {
        // "list of numbers of points in each row" follows the vertical
        // coordinate values; only its presence/absence affects num_elements
        // derivation here (quasi-regular grids), its contents aren't
        // otherwise surfaced.
        let n = if ni == 0xFFFF { nj } else { ni } as u64;
        *offset += nv * 4 + n * 2;
    } else if section_size > 32 {
        *offset += section_size - 32;
    }

    let (static_type, dynamic) = out.finish()?;
    Ok(Grid { static_type, dynamic, num_elements })
}

/// GRIB1 also allows a grid to be identified purely by a numeric
/// `gridDefinition` catalog entry (no GDS present), with the element count
/// looked up from a fixed historical WMO table. That table is not
/// reproduced here: such products are rejected as unsupported, the same
/// simplification this backend applies to non-lat/lon GDS grids.
fn predefined_grid(grid_definition: u8) -> Result<Grid> {
    Err(CodaError::unsupported(format!(
        "GRIB1 grid definition catalog entry ({grid_definition}) without a Grid Definition Section is not supported"
    )))
}

/// Returns the absolute bit offset of the bitmap's data bytes.
fn read_bms(source: &dyn ByteSource, offset: &mut u64) -> Result<i64> {
    let header = read_bytes(source, *offset, 6)?;
    let section_size = be24(&header[0..3]) as u64;
    let table_reference = be16(&header[4..6]);
    if table_reference != 0 {
        return Err(CodaError::unsupported("Bit Map Section with predefined bit map is not supported"));
    }
    let bitmask_bit_offset = ((*offset + 6) * 8) as i64;
    *offset += section_size;
    Ok(bitmask_bit_offset)
}

fn read_bds(
    source: &dyn ByteSource,
    offset: &mut u64,
    num_elements: u64,
    decimal_scale_factor: i32,
    bitmask_bit_offset: Option<i64>,
) -> Result<(TypeRef, DynamicRef)> {
    let header = read_bytes(source, *offset, 11)?;
    let section_size = be24(&header[0..3]) as u64;
    let flags = header[3];
    if flags & 0x80 != 0 {
        return Err(CodaError::unsupported("GRIB1 spherical harmonics packing is not supported"));
    }
    if flags & 0x40 != 0 {
        return Err(CodaError::unsupported("GRIB1 second-order (complex) packing is not supported"));
    }
    if flags & 0x10 != 0 {
        return Err(CodaError::unsupported("GRIB1 Binary Data Section extra flags are not supported"));
    }
    let binary_scale_factor = sign_magnitude(&header[4..6]) as i32;
    let reference_value = ibm_float_to_f32(header[6..10].try_into().unwrap());
    let bits_per_value = header[10];
    if bits_per_value > 63 {
        return Err(CodaError::product(format!("bitsPerValue ({bits_per_value}) too large")));
    }

    let values_offset = *offset + 11;
    *offset += section_size;

    values_array(
        num_elements,
        values_offset,
        bits_per_value,
        decimal_scale_factor,
        binary_scale_factor,
        reference_value,
        bitmask_bit_offset,
    )
}

/// Build the `values` array's static/dynamic pair: an f64 array whose
/// elements are never expanded individually, decoded on demand by a
/// cursor from [`SimplePacking`] (§4.10; see `Cursor::decode_packed_element`).
#[allow(clippy::too_many_arguments)]
pub(super) fn values_array(
    num_elements: u64,
    byte_offset: u64,
    bits_per_value: u8,
    decimal_scale_factor: i32,
    binary_scale_factor: i32,
    reference_value: f32,
    bitmask_bit_offset: Option<i64>,
) -> Result<(TypeRef, DynamicRef)> {
    let element_type: TypeRef = Arc::new(StaticType::Number(NumberType::new(NumberClass::Real, ReadType::F64, 64)));
    let array_type: TypeRef =
        Arc::new(StaticType::Array(ArrayType::new(element_type, vec![Dimension::Constant(num_elements)])));
    let packing = SimplePacking {
        reference: reference_value as f64,
        binary_scale: binary_scale_factor,
        decimal_scale: decimal_scale_factor,
        element_bit_size: bits_per_value as u32,
        bitmask_bit_offset,
    };
    let dynamic = Arc::new(DynamicType::Array(ArrayDynamic {
        static_type: array_type.clone(),
        num_elements,
        bit_offset: (byte_offset * 8) as i64,
        element_bit_size: bits_per_value as u64,
        elements: None,
        packing: Some(packing),
        attributes: None,
    }));
    Ok((array_type, dynamic))
}
