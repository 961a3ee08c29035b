// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Low-level CDF v3 record framing (§4.9 C9).
//!
//! Every CDF record is a 12-byte header - an 8-byte big-endian record size
//! followed by a 4-byte big-endian record type tag - followed immediately
//! by the record's own fields. Record framing (including every integer
//! field inside CDR/GDR/VDR/ADR/AEDR/VXR/CPR) is always big-endian on disk
//! regardless of the file's `Encoding`; only variable *values* stored in
//! VVR records follow the file's own declared byte order.

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{CodaError, Result};
use crate::types::number::{NumberClass, ReadType};

pub const CDR: i32 = 1;
pub const GDR: i32 = 2;
pub const RVDR: i32 = 3;
pub const ADR: i32 = 4;
pub const AEDR_RENTRY: i32 = 5;
pub const VXR: i32 = 6;
pub const VVR: i32 = 7;
pub const ZVDR: i32 = 8;
pub const AEDR_ZENTRY: i32 = 9;
pub const CPR: i32 = 11;
pub const CVVR: i32 = 13;

/// CDF EPOCH16 is explicitly unsupported by this implementation.
pub const DATA_TYPE_EPOCH16: i32 = 32;

pub fn read_i32(source: &dyn ByteSource, offset: u64) -> Result<i32> {
    let bytes = read_bytes(source, offset, 4)?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_i64(source: &dyn ByteSource, offset: u64) -> Result<i64> {
    let bytes = read_bytes(source, offset, 8)?;
    Ok(i64::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn read_u32(source: &dyn ByteSource, offset: u64) -> Result<u32> {
    let bytes = read_bytes(source, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a fixed-width, space/NUL-padded name field and trim the padding.
pub fn read_name(source: &dyn ByteSource, offset: u64, len: u64) -> Result<String> {
    let bytes = read_bytes(source, offset, len)?;
    let trimmed_len = bytes.iter().rposition(|&b| b != b' ' && b != 0).map(|i| i + 1).unwrap_or(0);
    Ok(String::from_utf8_lossy(&bytes[..trimmed_len]).into_owned())
}

/// Record type found at `offset + 8`.
pub fn record_type_at(source: &dyn ByteSource, offset: u64) -> Result<i32> {
    read_i32(source, offset + 8)
}

pub fn expect_record_type(source: &dyn ByteSource, offset: u64, expected: i32, label: &str) -> Result<()> {
    let actual = record_type_at(source, offset)?;
    if actual != expected {
        return Err(CodaError::product(format!("CDF file has invalid record type ({actual}) for {label} record")));
    }
    Ok(())
}

pub fn expect_one_of_record_type(source: &dyn ByteSource, offset: u64, expected: &[i32], label: &str) -> Result<i32> {
    let actual = record_type_at(source, offset)?;
    if !expected.contains(&actual) {
        return Err(CodaError::product(format!("CDF file has invalid record type ({actual}) for {label} record")));
    }
    Ok(actual)
}

/// One basic (non-string, non-EPOCH16) CDF element type's native Rust
/// representation. EPOCH (31) and TIME_TT2000 (33) are pre-normalized by
/// the caller to 45 (double) and 8 (int64) respectively before calling
/// this, matching the reference implementation's `time_type_new` split.
#[derive(Debug, Clone, Copy)]
pub struct NumericLayout {
    pub class: NumberClass,
    pub read_type: ReadType,
    pub byte_size: u64,
}

/// Map a CDF `data_type` code to its native numeric representation.
/// Returns `Ok(None)` for the string types (51/52), which the caller
/// handles separately since their byte size comes from `num_elems`
/// rather than being fixed by the type code.
pub fn numeric_layout(data_type: i32) -> Result<Option<NumericLayout>> {
    use NumberClass::{Integer, Real};
    use ReadType::*;
    Ok(Some(match data_type {
        1 | 41 => NumericLayout { class: Integer, read_type: I8, byte_size: 1 },
        2 => NumericLayout { class: Integer, read_type: I16, byte_size: 2 },
        4 => NumericLayout { class: Integer, read_type: I32, byte_size: 4 },
        8 => NumericLayout { class: Integer, read_type: I64, byte_size: 8 },
        11 => NumericLayout { class: Integer, read_type: U8, byte_size: 1 },
        12 => NumericLayout { class: Integer, read_type: U16, byte_size: 2 },
        14 => NumericLayout { class: Integer, read_type: U32, byte_size: 4 },
        21 | 44 => NumericLayout { class: Real, read_type: F32, byte_size: 4 },
        22 | 45 => NumericLayout { class: Real, read_type: F64, byte_size: 8 },
        // EPOCH/TIME_TT2000 attribute entries are not wrapped in a Special
        // Time type the way variable values are - an attribute has no
        // cursor of its own for a conversion expression's `.` to bind to,
        // so these read out as the plain stored double/int64.
        31 => NumericLayout { class: Real, read_type: F64, byte_size: 8 },
        33 => NumericLayout { class: Integer, read_type: I64, byte_size: 8 },
        51 | 52 => return Ok(None),
        DATA_TYPE_EPOCH16 => return Err(CodaError::unsupported("CDF EPOCH16 data type is not supported")),
        other => return Err(CodaError::invalid_argument(format!("invalid CDF data type ({other})"))),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;

    #[test]
    fn reads_big_endian_integers_regardless_of_host() {
        let src = MemorySource::new(vec![0x00, 0x00, 0x00, 0x01]);
        assert_eq!(read_i32(&src, 0).unwrap(), 1);
    }

    #[test]
    fn name_field_trims_trailing_padding() {
        let mut bytes = b"Epoch".to_vec();
        bytes.resize(16, b' ');
        let src = MemorySource::new(bytes);
        assert_eq!(read_name(&src, 0, 16).unwrap(), "Epoch");
    }

    #[test]
    fn numeric_layout_rejects_epoch16() {
        assert!(numeric_layout(DATA_TYPE_EPOCH16).is_err());
    }

    #[test]
    fn numeric_layout_treats_strings_as_none() {
        assert!(numeric_layout(51).unwrap().is_none());
        assert!(numeric_layout(52).unwrap().is_none());
    }
}
