// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record static type (§3 Static Type, §4.4 C4).
//!
//! Field lookup by name and by real-name is backed by a hash index built
//! once, after all fields are added, so `get_record_field_index_from_name`
//! (§4.8) is O(1) average rather than a linear scan.

use std::collections::HashMap;

use crate::core::{CodaError, Result};
use crate::expr::Expr;
use crate::types::TypeRef;

/// One field of a Record type.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub real_name: Option<String>,
    pub field_type: TypeRef,
    pub optional: bool,
    pub hidden: bool,
    pub availability_expr: Option<Box<Expr>>,
    pub bit_offset_expr: Option<Box<Expr>>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Field {
            name: name.into(),
            real_name: None,
            field_type,
            optional: false,
            hidden: false,
            availability_expr: None,
            bit_offset_expr: None,
        }
    }

    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_availability_expr(mut self, expr: Expr) -> Self {
        self.availability_expr = Some(Box::new(expr));
        self
    }

    pub fn with_bit_offset_expr(mut self, expr: Expr) -> Self {
        self.bit_offset_expr = Some(Box::new(expr));
        self
    }
}

/// The `Record` static type variant. `is_union` marks a record whose fields
/// are mutually exclusive, one selected at a time by `union_selector`.
#[derive(Debug, Clone)]
pub struct RecordType {
    fields: Vec<Field>,
    index_by_name: HashMap<String, usize>,
    index_by_real_name: HashMap<String, usize>,
    pub is_union: bool,
    pub union_selector: Option<Box<Expr>>,
    pub attributes: Option<TypeRef>,
}

impl RecordType {
    /// Construct an empty record. Use [`RecordType::add_field`] to populate
    /// it, then [`RecordType::validate`] to check §4.4's invariants.
    pub fn new() -> Self {
        RecordType {
            fields: Vec::new(),
            index_by_name: HashMap::new(),
            index_by_real_name: HashMap::new(),
            is_union: false,
            union_selector: None,
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: TypeRef) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn as_union(mut self, selector: Expr) -> Self {
        self.is_union = true;
        self.union_selector = Some(Box::new(selector));
        self
    }

    /// Append a field, rejecting a duplicate name (case-sensitive).
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.index_by_name.contains_key(&field.name) {
            return Err(CodaError::invalid_argument(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
        let index = self.fields.len();
        self.index_by_name.insert(field.name.clone(), index);
        if let Some(real_name) = &field.real_name {
            self.index_by_real_name.insert(real_name.clone(), index);
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// O(1) average field lookup by declared name.
    pub fn field_index_by_name(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// O(1) average field lookup by real (display) name.
    pub fn field_index_by_real_name(&self, real_name: &str) -> Option<usize> {
        self.index_by_real_name.get(real_name).copied()
    }

    /// Validate the invariants §4.4 requires of a constructed record:
    /// non-empty fields (unless explicitly marked empty via
    /// `allow_empty`), and a union must carry a selector expression.
    pub fn validate(&self, allow_empty: bool) -> Result<()> {
        if self.fields.is_empty() && !allow_empty {
            return Err(CodaError::data_definition_msg(
                "record type has no fields and was not explicitly marked empty",
            ));
        }
        if self.is_union && self.union_selector.is_none() {
            return Err(CodaError::data_definition_msg("union record has no field-selector expression"));
        }
        Ok(())
    }
}

impl Default for RecordType {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::number::{NumberClass, NumberType, ReadType};
    use crate::types::StaticType;
    use std::sync::Arc;

    fn int_field(name: &str) -> Field {
        let t = Arc::new(StaticType::Number(NumberType::new(NumberClass::Integer, ReadType::I32, 32)));
        Field::new(name, t)
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let mut record = RecordType::new();
        record.add_field(int_field("a")).unwrap();
        assert!(record.add_field(int_field("a")).is_err());
    }

    #[test]
    fn looks_up_by_name_and_real_name() {
        let mut record = RecordType::new();
        record.add_field(int_field("a").with_real_name("Alpha")).unwrap();
        record.add_field(int_field("b")).unwrap();
        assert_eq!(record.field_index_by_name("a"), Some(0));
        assert_eq!(record.field_index_by_real_name("Alpha"), Some(0));
        assert_eq!(record.field_index_by_name("b"), Some(1));
        assert_eq!(record.field_index_by_name("missing"), None);
    }

    #[test]
    fn validate_rejects_empty_unless_allowed() {
        let record = RecordType::new();
        assert!(record.validate(false).is_err());
        assert!(record.validate(true).is_ok());
    }
}
