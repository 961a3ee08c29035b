// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GRIB 1/2 backend (§4.10 C10).
//!
//! A GRIB product is a concatenation of one or more independent messages,
//! each starting with an 8-byte `"GRIB"` + length + edition Indicator
//! Section (edition 1) or a 16-byte Indicator Section with an 8-byte
//! message length (edition 2). Filler bytes between messages (some
//! archives pad with NUL or whitespace) are skipped by scanning for the
//! next `'G'`. Every message becomes one element of the product's root
//! array, carried as a union of the two edition-specific record shapes -
//! mirroring how the two editions are genuinely unrelated wire formats
//! that happen to share a container.

mod grib1;
mod grib2;
mod packing;
mod record;

use std::sync::Arc;

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{CodaError, Result};
use crate::dynamic::{ArrayDynamic, DynamicRef, DynamicType, RecordDynamic};
use crate::expr::{Expr, Path, PathStep};
use crate::types::array::{ArrayType, Dimension};
use crate::types::record::{Field, RecordType};
use crate::types::{StaticType, TypeRef};

fn be24(b: &[u8]) -> u64 {
    ((b[0] as u64) * 256 + b[1] as u64) * 256 + b[2] as u64
}

fn be64(b: &[u8]) -> u64 {
    let mut value = 0u64;
    for &byte in b {
        value = (value << 8) | byte as u64;
    }
    value
}

/// A union static type of a `grib1` and a `grib2` message record, selected
/// by comparing the shared `editionNumber` field. Each message instance
/// only ever populates one of the two fields.
fn message_union_type(grib1_type: TypeRef, grib2_type: TypeRef) -> Result<TypeRef> {
    let selector = Expr::Eq(
        Box::new(Expr::Path(Path { absolute: false, steps: vec![PathStep::Field("editionNumber".into())] })),
        Box::new(Expr::IntLiteral(1)),
    );
    let mut ty = RecordType::new().as_union(selector);
    ty.add_field(Field::new("grib1", grib1_type))?;
    ty.add_field(Field::new("grib2", grib2_type))?;
    ty.validate(false)?;
    Ok(Arc::new(StaticType::Record(ty)))
}

fn wrap_message(union_type: TypeRef, grib_version: u8, message: DynamicRef) -> DynamicRef {
    let fields = if grib_version == 1 { vec![Some(message), None] } else { vec![None, Some(message)] };
    Arc::new(DynamicType::Record(RecordDynamic { static_type: union_type, fields, attributes: None }))
}

/// Open a GRIB product, returning the root array of per-message records.
/// GRIB never compresses its own container the way CDF variable records
/// can, so the byte source handed back is simply the input file.
pub fn open(file: Arc<dyn ByteSource>) -> Result<(Arc<dyn ByteSource>, DynamicRef)> {
    let size = file.size();
    let mut offset = 0u64;
    let mut messages: Vec<(u8, DynamicRef)> = Vec::new();
    let mut message_number = 0u32;

    while offset + 1 < size {
        while offset + 1 < size {
            let byte = read_bytes(file.as_ref(), offset, 1)?[0];
            if byte == b'G' {
                break;
            }
            offset += 1;
        }
        if offset + 1 >= size {
            break;
        }

        let indicator = read_bytes(file.as_ref(), offset, 8)?;
        if &indicator[0..4] != b"GRIB" {
            return Err(CodaError::product(format!("invalid indicator for message {message_number}")));
        }
        let grib_version = indicator[7];
        if grib_version != 1 && grib_version != 2 {
            return Err(CodaError::unsupported(format!(
                "unsupported GRIB format version ({grib_version}) for message {message_number}"
            )));
        }

        let (message, message_size) = if grib_version == 1 {
            let message_size = be24(&indicator[4..7]);
            let message = grib1::read_message(file.as_ref(), offset + 8)?;
            (message, message_size)
        } else {
            let length_bytes = read_bytes(file.as_ref(), offset + 8, 8)?;
            let message_size = be64(&length_bytes);
            let discipline = indicator[6];
            let message = grib2::read_message(file.as_ref(), discipline, offset + 16)?;
            (message, message_size)
        };

        messages.push((grib_version, message));
        offset += message_size;
        message_number += 1;
        if message_size == 0 {
            return Err(CodaError::product("GRIB message reports zero size"));
        }
    }

    if messages.is_empty() {
        return Err(CodaError::product("GRIB product contains no messages"));
    }

    let grib1_type = messages
        .iter()
        .find(|(version, _)| *version == 1)
        .map(|(_, m)| m.static_type().clone())
        .unwrap_or_else(|| messages[0].1.static_type().clone());
    let grib2_type = messages
        .iter()
        .find(|(version, _)| *version == 2)
        .map(|(_, m)| m.static_type().clone())
        .unwrap_or_else(|| messages[0].1.static_type().clone());
    let union_type = message_union_type(grib1_type, grib2_type)?;

    let elements: Vec<DynamicRef> =
        messages.into_iter().map(|(version, message)| wrap_message(union_type.clone(), version, message)).collect();
    let num_elements = elements.len() as u64;
    let array_type: TypeRef =
        Arc::new(StaticType::Array(ArrayType::new(union_type, vec![Dimension::Constant(num_elements)])));
    let root = Arc::new(DynamicType::Array(ArrayDynamic {
        static_type: array_type,
        num_elements,
        bit_offset: -1,
        element_bit_size: 0,
        elements: Some(elements),
        packing: None,
        attributes: None,
    }));

    Ok((file, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;

    #[test]
    fn rejects_file_with_bad_indicator() {
        let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(b"XXXX0000".to_vec()));
        assert!(open(source).is_err());
    }

    #[test]
    fn rejects_unsupported_edition() {
        let mut bytes = b"GRIB".to_vec();
        bytes.extend_from_slice(&[0, 0, 1]);
        bytes.push(9); // unsupported edition
        let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(bytes));
        assert!(open(source).is_err());
    }
}
