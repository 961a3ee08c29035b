// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Product open/close and format/class/type recognition (§4.8 C8, §6).
//!
//! A [`Product`] owns the byte source a cursor reads through and the
//! dynamic-type tree a backend built from it; [`Product::cursor`] hands out
//! independent [`Cursor`]s positioned at the root, the way `coda_cursor` is
//! a value distinct from the `coda_product` it was set from. Recognition
//! (`open`, `recognize_file`) is native-format-first: the backend's own
//! magic bytes decide CDF vs. GRIB, and the codadef dictionary is only
//! consulted afterwards to label the already-built tree with a class/type
//! name, by evaluating each candidate product type's detection rules
//! against a cursor over that tree. Detection never changes which tree is
//! built - codadef definitions for the formats this crate implements
//! natively describe the same physical layout the backend already decodes,
//! they don't drive a separate interpreter.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::backend;
use crate::bitio::{ByteSource, FileSource};
use crate::codadef::{self, DetectionRule, ProductClass};
use crate::core::{CodaError, Format, Options, Result};
use crate::cursor::Cursor;
use crate::dynamic::DynamicRef;
use crate::expr::{self, Value};

/// An opened product: a backing byte source, its dynamic-type tree, and
/// (if recognized against a loaded codadef) the product class/type/version
/// that identifies it.
pub struct Product {
    path: String,
    size: u64,
    format: Format,
    class_name: Option<String>,
    type_name: Option<String>,
    version: Option<u32>,
    source: Arc<dyn ByteSource>,
    root: DynamicRef,
}

/// The result of [`Product::recognize_file`]: identification without
/// holding the product open.
#[derive(Debug, Clone)]
pub struct RecognizedProduct {
    pub size: u64,
    pub format: Format,
    pub class_name: Option<String>,
    pub type_name: Option<String>,
    pub version: Option<u32>,
}

struct Probe {
    size: u64,
    format: Format,
    source: Arc<dyn ByteSource>,
    root: DynamicRef,
    class_name: Option<String>,
    type_name: Option<String>,
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

fn probe(path: &Path) -> Result<Probe> {
    let path_str = path.display().to_string();
    let file: Arc<dyn ByteSource> = Arc::new(FileSource::open(path, Options::current().use_mmap)?);
    let size = file.size();

    let format = backend::recognize(file.as_ref())?
        .ok_or_else(|| CodaError::NoSuchProduct { path: path_str.clone() })?;
    if !format.is_implemented() {
        return Err(CodaError::unsupported(format!("the {format} backend is not implemented")));
    }

    let (source, root) = backend::open(format, file)?;

    let filename = file_name(path);
    let mut cursor = Cursor::new(source.clone(), filename.clone(), format);
    cursor.set_product(root.clone());
    let (class_name, type_name) = match recognize_class_and_type(format, size, &filename, &cursor)? {
        Some((class, ty)) => (Some(class), Some(ty)),
        None => (None, None),
    };

    debug!(path = %path_str, %format, class = class_name.as_deref().unwrap_or("-"), type_name = type_name.as_deref().unwrap_or("-"), "opened product");

    Ok(Probe { size, format, source, root, class_name, type_name })
}

/// Find the first loaded product class/type whose format matches and whose
/// detection rules all pass. Classes are tried in sorted order by name (a
/// `HashMap`-backed dictionary has no inherent order, and detection must be
/// reproducible across runs), then product types within a class are tried
/// in sorted order by name; ambiguous dictionaries (two types both
/// matching) resolve to whichever sorts first, the same deterministic
/// "first match wins" policy `codafind` applies to its own filters.
fn recognize_class_and_type(
    format: Format,
    size: u64,
    filename: &str,
    cursor: &Cursor,
) -> Result<Option<(String, String)>> {
    let mut class_names = codadef::global_dictionary().class_names()?;
    class_names.sort();
    for class_name in class_names {
        let found = codadef::global_dictionary()
            .with_class(&class_name, |class| match_class(class, format, size, filename, cursor))?;
        if let Some(result) = found {
            if let Some(type_name) = result? {
                return Ok(Some((class_name, type_name)));
            }
        }
    }
    Ok(None)
}

fn match_class(
    class: &ProductClass,
    format: Format,
    size: u64,
    filename: &str,
    cursor: &Cursor,
) -> Result<Option<String>> {
    let mut product_types: Vec<_> = class.product_types.values().collect();
    product_types.sort_by(|a, b| a.name.cmp(&b.name));
    for product_type in product_types {
        if product_type.format != format {
            continue;
        }
        for rule in &product_type.detection_rules {
            if matches_rule(rule, size, filename, cursor)? {
                return Ok(Some(product_type.name.clone()));
            }
        }
    }
    Ok(None)
}

fn matches_rule(rule: &DetectionRule, size: u64, filename: &str, cursor: &Cursor) -> Result<bool> {
    if let Some(expected) = rule.file_size {
        if expected != size {
            return Ok(false);
        }
    }
    if let Some(pattern) = &rule.filename_regex {
        let re = Regex::new(pattern)
            .map_err(|e| CodaError::data_definition_msg(format!("invalid filename pattern '{pattern}': {e}")))?;
        if !re.is_match(filename) {
            return Ok(false);
        }
    }
    for expression in &rule.expressions {
        match expr::eval(expression, Some(cursor))? {
            Value::Bool(true) => {}
            Value::Bool(false) => return Ok(false),
            other => {
                return Err(CodaError::expression_eval(format!(
                    "detection rule expression did not evaluate to a boolean (got {other:?})"
                )))
            }
        }
    }
    Ok(true)
}

impl Product {
    /// Open `path`, auto-recognizing its format from its leading bytes and
    /// (if a matching codadef is loaded) its product class/type.
    pub fn open(path: impl AsRef<Path>) -> Result<Product> {
        let path = path.as_ref();
        let probe = probe(path)?;
        Ok(Product {
            path: path.display().to_string(),
            size: probe.size,
            format: probe.format,
            version: probe.class_name.as_ref().map(|_| 1),
            class_name: probe.class_name,
            type_name: probe.type_name,
            source: probe.source,
            root: probe.root,
        })
    }

    /// Open `path`, pinning the product class/type/version explicitly
    /// instead of running detection rules. The dynamic-type tree is still
    /// built by the native backend for `class`'s format; the codadef entry
    /// only supplies the label, since this crate has no separate
    /// definition-driven interpreter for the formats it implements.
    pub fn open_as(path: impl AsRef<Path>, class_name: &str, type_name: &str, version: u32) -> Result<Product> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let class = codadef::global_dictionary()
            .class(class_name)?
            .ok_or_else(|| CodaError::NoSuchProduct { path: path_str.clone() })?;
        let product_type = class
            .product_types
            .get(type_name)
            .ok_or_else(|| CodaError::NoSuchProduct { path: path_str.clone() })?;
        let format = product_type.format;
        if !format.is_implemented() {
            return Err(CodaError::unsupported(format!("the {format} backend is not implemented")));
        }

        let file: Arc<dyn ByteSource> = Arc::new(FileSource::open(path, Options::current().use_mmap)?);
        let size = file.size();
        let (source, root) = backend::open(format, file)?;

        Ok(Product {
            path: path_str,
            size,
            format,
            class_name: Some(class_name.to_string()),
            type_name: Some(type_name.to_string()),
            version: Some(version),
            source,
            root,
        })
    }

    /// Identify `path` without keeping it open.
    pub fn recognize_file(path: impl AsRef<Path>) -> Result<RecognizedProduct> {
        let probe = probe(path.as_ref())?;
        Ok(RecognizedProduct {
            size: probe.size,
            format: probe.format,
            version: probe.class_name.as_ref().map(|_| 1),
            class_name: probe.class_name,
            type_name: probe.type_name,
        })
    }

    /// Path this product was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Size of the original product file, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The product's recognized format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// The product class name, if a loaded codadef matched this file.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// The product type name, if a loaded codadef matched this file.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// The product definition version, if a loaded codadef matched this
    /// file.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// A new cursor positioned at this product's root.
    pub fn cursor(&self) -> Cursor {
        let filename = file_name(Path::new(&self.path));
        let mut cursor = Cursor::new(self.source.clone(), filename, self.format);
        cursor.set_product(self.root.clone());
        cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn grib1_message() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"GRIB");
        bytes.extend_from_slice(&[0, 0, 0]); // message length placeholder, patched below
        bytes.push(1); // edition
        let mut pds = vec![0u8; 28];
        pds[0..3].copy_from_slice(&[0, 0, 28]);
        pds[7] = 0; // no GDS, no BMS -> will fail to build a tree without a catalog grid
        bytes.extend_from_slice(&pds);
        bytes.extend_from_slice(b"7777");
        let total_len = bytes.len() as u32;
        bytes[4] = (total_len >> 16) as u8;
        bytes[5] = (total_len >> 8) as u8;
        bytes[6] = total_len as u8;
        bytes
    }

    #[test]
    fn open_surfaces_unsupported_grid_as_a_product_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.grib");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&grib1_message()).unwrap();
        drop(file);

        let result = Product::open(&path);
        assert!(result.is_err());
    }

    #[test]
    fn recognize_file_reports_not_found_for_unmagicked_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.bin");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        drop(file);

        let result = Product::recognize_file(&path);
        assert!(matches!(result, Err(CodaError::NoSuchProduct { .. })));
    }
}
