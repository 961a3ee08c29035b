// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codadef data dictionary (§3 Codadef, §4.6 C6).
//!
//! A codadef is a ZIP archive of XML definition files describing product
//! classes, their product types, and the named static types each type is
//! built from. [`xml`] drives `quick-xml` over the archive's XML members
//! and builds this in-memory dictionary; [`dictionary::Dictionary`] is the
//! process-wide registry product opening consults to recognize and
//! describe files.

pub mod dictionary;
pub mod loader;
pub mod strings;
pub mod xml;

use std::collections::HashMap;

use crate::core::Format;
use crate::types::TypeRef;

/// A compiled detection rule: a product matches a [`ProductType`] when all
/// of its match expressions evaluate true and (if present) its size and
/// filename pattern match.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    pub file_size: Option<u64>,
    pub filename_regex: Option<String>,
    pub expressions: Vec<crate::expr::Expr>,
}

/// One named product type within a class: the root static type plus the
/// rules used to recognize a file as this type.
#[derive(Debug, Clone)]
pub struct ProductType {
    pub name: String,
    pub description: String,
    pub format: Format,
    pub root_type: TypeRef,
    pub detection_rules: Vec<DetectionRule>,
}

/// A named, versioned static type declared at class scope for reuse across
/// product types (`NamedType` in the XML).
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    pub static_type: TypeRef,
}

/// A product class: a named group of product types and named types sharing
/// one revision number, the unit codadef loading and revision resolution
/// operate on (§4.6, §8 invariant 7).
#[derive(Debug, Clone)]
pub struct ProductClass {
    pub name: String,
    pub description: String,
    pub revision: u64,
    pub product_types: HashMap<String, ProductType>,
    pub named_types: HashMap<String, NamedType>,
}

impl ProductClass {
    pub fn new(name: impl Into<String>, revision: u64) -> Self {
        ProductClass {
            name: name.into(),
            description: String::new(),
            revision,
            product_types: HashMap::new(),
            named_types: HashMap::new(),
        }
    }
}

/// A full product definition identity: class + type, used by
/// `get_product_definition_file`-style lookups (§9 decides this returns the
/// defining codadef's path, not a type name — see DESIGN.md).
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub class_name: String,
    pub type_name: String,
    pub source_file: String,
}

pub use dictionary::Dictionary;
pub use loader::{global as global_dictionary, load_definition_path};
