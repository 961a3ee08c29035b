// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GRIB edition 2 message parsing (§4.10 C10).
//!
//! Unlike edition 1's fixed section layout, a GRIB2 message is a sequence
//! of self-describing, numbered sections (1 Identification, 2 Local Use,
//! 3 Grid Definition, 4 Product Definition, 5 Data Representation, 6 Bit
//! Map, 7 Data) that repeats 3-7 once per distinct field in the message.
//! Only the common subset this backend recognizes is decoded: Grid
//! Definition Templates 0-3 and 40-43 (lat/lon and Gaussian, optionally
//! rotated/stretched - the rotation/stretch parameters themselves are not
//! surfaced), Product Definition Templates 0-6, 15 and 51 (and 40, for
//! chemical constituents), and Data Representation Templates 0/1 (simple
//! packing, with an IEEE754 `referenceValue`, unlike edition 1's IBM
//! float).

use std::sync::Arc;

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{ArrayOrdering, CodaError, Result};
use crate::dynamic::{ArrayDynamic, DynamicRef, DynamicType};
use crate::types::array::{ArrayType, Dimension};
use crate::types::{StaticType, TypeRef};

use super::grib1::values_array;
use super::packing::sign_magnitude;
use super::record::RecordBuilder;

fn be16(b: &[u8]) -> u16 {
    (b[0] as u16) * 256 + b[1] as u16
}

fn be32(b: &[u8]) -> u32 {
    (((b[0] as u32) * 256 + b[1] as u32) * 256 + b[2] as u32) * 256 + b[3] as u32
}

struct FixedSurface {
    kind: u8,
    value: f64,
}

fn read_fixed_surface(buf: &[u8]) -> FixedSurface {
    let kind = buf[0];
    if kind == 255 {
        return FixedSurface { kind, value: f64::NAN };
    }
    let mut scale = buf[1] as i8 as i32;
    let mut value = be32(&buf[2..6]) as f64;
    while scale < 0 {
        value *= 10.0;
        scale += 1;
    }
    while scale > 0 {
        value /= 10.0;
        scale -= 1;
    }
    FixedSurface { kind, value }
}

/// `section1_offset` is the byte offset of the Identification Section,
/// 16 bytes past the start of the message.
pub fn read_message(source: &dyn ByteSource, discipline: u8, section1_offset: u64) -> Result<DynamicRef> {
    let mut offset = section1_offset;
    let mut out = RecordBuilder::new();
    out.u8("editionNumber", 2);
    out.u8("discipline", discipline);

    let id = read_bytes(source, offset, 21)?;
    let section_size = be32(&id[0..4]) as u64;
    if id[4] != 1 {
        return Err(CodaError::product("wrong Section Number for GRIB2 Identification Section"));
    }
    out.u16("centre", be16(&id[5..7]));
    out.u16("subCentre", be16(&id[7..9]));
    out.u8("masterTablesVersion", id[9]);
    out.u8("localTablesVersion", id[10]);
    out.u8("significanceOfReferenceTime", id[11]);
    out.u16("year", be16(&id[12..14]));
    out.u8("month", id[14]);
    out.u8("day", id[15]);
    out.u8("hour", id[16]);
    out.u8("minute", id[17]);
    out.u8("second", id[18]);
    out.u8("productionStatusOfProcessedData", id[19]);
    out.u8("typeOfProcessedData", id[20]);
    offset += section_size;

    let mut data_fields: Vec<(TypeRef, DynamicRef)> = Vec::new();
    let mut parameter_category = 0u8;
    let mut parameter_number = 0u8;
    let mut first_surface = FixedSurface { kind: 255, value: f64::NAN };
    let mut second_surface = FixedSurface { kind: 255, value: f64::NAN };

    loop {
        let marker = read_bytes(source, offset, 4)?;
        if &marker[..] == b"7777" {
            break;
        }
        let header = read_bytes(source, offset, 5)?;
        let section_size = be32(&header[0..4]) as u64;
        let section_number = header[4];
        let body_offset = offset + 5;

        match section_number {
            2 => {
                // Local Use Section: carried opaquely, not surfaced.
                offset += section_size;
            }
            3 => {
                validate_grid_section(source, body_offset)?;
                offset += section_size;
            }
            4 => {
                let pds = read_bytes(source, body_offset, 4)?;
                let template = be16(&pds[2..4]);
                let (cat, num, surf1, surf2) = read_product_definition(source, body_offset + 4, template)?;
                parameter_category = cat;
                parameter_number = num;
                first_surface = surf1;
                second_surface = surf2;
                offset += section_size;
            }
            5 => {
                let (data_type, data_value, next_offset) = read_data_representation_through_data(
                    source,
                    offset,
                    section_size,
                    body_offset,
                    parameter_category,
                    parameter_number,
                    &first_surface,
                    &second_surface,
                )?;
                data_fields.push((data_type, data_value));
                offset = next_offset;
            }
            other => {
                return Err(CodaError::product(format!("invalid GRIB2 Section Number ({other})")));
            }
        }
    }

    if data_fields.is_empty() {
        return Err(CodaError::product("GRIB2 message contains no data"));
    }
    let element_type = data_fields[0].0.clone();
    let elements: Vec<DynamicRef> = data_fields.into_iter().map(|(_, value)| value).collect();
    let num_elements = elements.len() as u64;
    let data_array_type: TypeRef = Arc::new(StaticType::Array(
        ArrayType::new(element_type, vec![Dimension::Constant(num_elements)]).with_ordering(ArrayOrdering::C),
    ));
    let data_array = Arc::new(DynamicType::Array(ArrayDynamic {
        static_type: data_array_type.clone(),
        num_elements,
        bit_offset: -1,
        element_bit_size: 0,
        elements: Some(elements),
        packing: None,
        attributes: None,
    }));
    out.field("data", data_array_type, data_array);

    out.finish().map(|(_, dynamic)| dynamic)
}

/// Validate that a Grid Definition Section describes a supported lat/lon
/// (or Gaussian) grid. Geometry fields aren't retained on the message
/// record; `values`' element count instead comes from the Data
/// Representation Section, which carries its own authoritative count.
fn validate_grid_section(source: &dyn ByteSource, body_offset: u64) -> Result<()> {
    let header = read_bytes(source, body_offset, 9)?;
    let source_of_definition = header[0];
    let template_number = be16(&header[7..9]);
    if source_of_definition != 0 || !(template_number <= 3 || (40..=43).contains(&template_number)) {
        return Err(CodaError::unsupported(format!(
            "unsupported grid source/template ({source_of_definition}/{template_number})"
        )));
    }
    let number_interpretation = header[6];
    if number_interpretation > 0 {
        return Err(CodaError::unsupported("'list of numbers' grids are not supported"));
    }
    Ok(())
}

fn read_product_definition(
    source: &dyn ByteSource,
    offset: u64,
    template: u16,
) -> Result<(u8, u8, FixedSurface, FixedSurface)> {
    if template <= 6 || template == 15 || template == 51 {
        let buf = read_bytes(source, offset, 25)?;
        let category = buf[0];
        let number = buf[1];
        let first = read_fixed_surface(&buf[13..19]);
        let second = read_fixed_surface(&buf[19..25]);
        Ok((category, number, first, second))
    } else if template == 40 {
        let buf = read_bytes(source, offset, 27)?;
        let category = buf[0];
        let number = buf[1];
        let first = read_fixed_surface(&buf[15..21]);
        let second = read_fixed_surface(&buf[21..27]);
        Ok((category, number, first, second))
    } else {
        Err(CodaError::unsupported(format!("unsupported Product Definition Template ({template})")))
    }
}

/// Section 5 (Data Representation), 6 (Bit Map) and 7 (Data) are read
/// together: the packed `values` array needs the bitmask offset from
/// section 6 (if present) before it can be built, and section 7 is just
/// the raw packed bytes section 5/6 already describe the layout of.
#[allow(clippy::too_many_arguments)]
fn read_data_representation_through_data(
    source: &dyn ByteSource,
    section5_offset: u64,
    section5_size: u64,
    body_offset: u64,
    parameter_category: u8,
    parameter_number: u8,
    first_surface: &FixedSurface,
    second_surface: &FixedSurface,
) -> Result<(TypeRef, DynamicRef, u64)> {
    let drs = read_bytes(source, body_offset, 6)?;
    let num_elements = be32(&drs[0..4]) as u64;
    let template = be16(&drs[4..6]);
    if template != 0 && template != 1 {
        return Err(CodaError::unsupported(format!("unsupported Data Representation Template ({template})")));
    }
    let reference_bytes = read_bytes(source, body_offset + 6, 4)?;
    let reference_value = f32::from_be_bytes(reference_bytes.try_into().unwrap());
    let scale_bytes = read_bytes(source, body_offset + 10, 5)?;
    let binary_scale_factor = sign_magnitude(&scale_bytes[0..2]) as i32;
    let decimal_scale_factor = sign_magnitude(&scale_bytes[2..4]) as i32;
    let bits_per_value = scale_bytes[4];
    if bits_per_value > 63 {
        return Err(CodaError::product(format!("bitsPerValue ({bits_per_value}) too large")));
    }

    let bms_offset = section5_offset + section5_size;
    let bms_header = read_bytes(source, bms_offset, 6)?;
    let bms_section_size = be32(&bms_header[0..4]) as u64;
    let bitmap_indicator = bms_header[4];
    let bitmask_bit_offset = match bitmap_indicator {
        0 => Some(((bms_offset + 6) * 8) as i64),
        255 => None,
        other => {
            return Err(CodaError::unsupported(format!(
                "predefined or previously-defined Bit Map ({other}) is not supported"
            )));
        }
    };

    let data_section_offset = bms_offset + bms_section_size;
    let data_header = read_bytes(source, data_section_offset, 5)?;
    if data_header[4] != 7 {
        return Err(CodaError::product("expected GRIB2 Data Section after Data Representation Section"));
    }
    let data_section_size = be32(&data_header[0..4]) as u64;
    let values_offset = data_section_offset + 5;

    let (values_type, values) = values_array(
        num_elements,
        values_offset,
        bits_per_value,
        decimal_scale_factor,
        binary_scale_factor,
        reference_value,
        bitmask_bit_offset,
    )?;

    let mut data = RecordBuilder::new();
    data.u8("parameterCategory", parameter_category);
    data.u8("parameterNumber", parameter_number);
    data.u8("typeOfFirstFixedSurface", first_surface.kind);
    data.f64("firstFixedSurface", first_surface.value);
    data.u8("typeOfSecondFixedSurface", second_surface.kind);
    data.f64("secondFixedSurface", second_surface.value);
    data.u8("bitsPerValue", bits_per_value);
    data.i16("decimalScaleFactor", decimal_scale_factor);
    data.i16("binaryScaleFactor", binary_scale_factor);
    data.f32("referenceValue", reference_value);
    data.field("values", values_type, values);
    let (data_type, data_value) = data.finish()?;

    Ok((data_type, data_value, data_section_offset + data_section_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_surface_applies_decimal_scale() {
        // scaleFactor=2, scaledValue=12345 -> 123.45
        let buf = [0u8, 2, 0, 0, 0x30, 0x39];
        let surface = read_fixed_surface(&buf);
        assert!((surface.value - 123.45).abs() < 1e-6);
    }

    #[test]
    fn fixed_surface_missing_is_nan() {
        let buf = [255u8, 0, 0, 0, 0, 0];
        assert!(read_fixed_surface(&buf).value.is_nan());
    }
}
