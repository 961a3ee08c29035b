// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw deflate decompression for ZIP entries (method 8) and CDF's
//! gzip-compressed variable records.

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::core::{CodaError, Result};

/// Inflate `compressed` (a raw deflate stream, no zlib or gzip header) into
/// exactly `expected_size` bytes.
pub fn inflate_raw(compressed: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut out = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodaError::invalid_format(format!("invalid or incomplete deflate data: {e}")))?;
    if out.len() != expected_size {
        return Err(CodaError::invalid_format(format!(
            "inflated size {} does not match expected size {expected_size}",
            out.len()
        )));
    }
    Ok(out)
}

/// Inflate a gzip-wrapped buffer (used for CDF compressed variable records),
/// which carries its own header/trailer rather than a raw deflate stream.
pub fn inflate_gzip(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::GzDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CodaError::invalid_format(format!("invalid gzip data: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn inflate_raw_round_trips() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let restored = inflate_raw(&compressed, original.len()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn inflate_raw_rejects_size_mismatch() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello").unwrap();
        let compressed = encoder.finish().unwrap();
        assert!(inflate_raw(&compressed, 999).is_err());
    }

    #[test]
    fn inflate_gzip_round_trips() {
        let original = b"gzip wrapped variable record payload".to_vec();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let restored = inflate_gzip(&compressed).unwrap();
        assert_eq!(restored, original);
    }
}
