// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Backend dispatch (§6): recognizing a self-describing product's format
//! from its leading bytes and handing off to the matching backend to build
//! its dynamic-type tree. Every backend returns the same shape - the byte
//! source a cursor should read from (which may differ from the input file,
//! e.g. CDF's inflated-variable overflow region) paired with the product's
//! root dynamic type - so [`crate::product::Product`] doesn't need to know
//! which backend produced either.

pub mod cdf;
pub mod grib;

use std::sync::Arc;

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{CodaError, Format, Result};
use crate::dynamic::DynamicRef;

/// Recognize a product's format from its first bytes (§6 magic-byte
/// recognition). Returns `None` for formats this build doesn't recognize
/// from a plain magic number (ASCII/XML/binary codadef products need their
/// definition path set explicitly instead).
pub fn recognize(source: &dyn ByteSource) -> Result<Option<Format>> {
    if source.size() < 8 {
        return Ok(None);
    }
    let magic = read_bytes(source, 0, 4)?;
    if magic == [0xCD, 0xF3, 0x00, 0x01] {
        return Ok(Some(Format::Cdf));
    }
    if &magic == b"GRIB" {
        return Ok(Some(Format::Grib));
    }
    Ok(None)
}

/// Open a product whose format has already been determined (e.g. by
/// [`recognize`], or pinned ahead of time by `open_as`). Only the formats
/// [`Format::is_implemented`] returns true for can actually be opened here.
pub fn open(format: Format, file: Arc<dyn ByteSource>) -> Result<(Arc<dyn ByteSource>, DynamicRef)> {
    match format {
        Format::Cdf => cdf::open(file),
        Format::Grib => grib::open(file),
        other => Err(CodaError::unsupported(format!("the {other} backend is not implemented"))),
    }
}

/// Recognize and open in one step, for callers that don't need the
/// intermediate [`Format`] value.
pub fn open_auto(file: Arc<dyn ByteSource>) -> Result<(Arc<dyn ByteSource>, DynamicRef)> {
    match recognize(file.as_ref())? {
        Some(format) => open(format, file),
        None => Err(CodaError::unsupported("unrecognized product format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;

    #[test]
    fn recognizes_cdf_magic() {
        let mut bytes = vec![0xCD, 0xF3, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xFF];
        bytes.resize(16, 0);
        let source = MemorySource::new(bytes);
        assert_eq!(recognize(&source).unwrap(), Some(Format::Cdf));
    }

    #[test]
    fn recognizes_grib_magic() {
        let mut bytes = b"GRIB".to_vec();
        bytes.resize(16, 0);
        let source = MemorySource::new(bytes);
        assert_eq!(recognize(&source).unwrap(), Some(Format::Grib));
    }

    #[test]
    fn unrecognized_magic_is_none() {
        let source = MemorySource::new(vec![0u8; 16]);
        assert_eq!(recognize(&source).unwrap(), None);
    }
}
