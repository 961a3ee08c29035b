// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Static type system (§3 Static Type, §4.4 C4).
//!
//! A [`StaticType`] describes the *shape* of data as declared by a codadef
//! definition: independent of any particular product file, it says how many
//! bits a value occupies (possibly as an expression, resolved once a cursor
//! is available) and how to interpret those bits. [`TypeRef`] is the shared,
//! immutable handle every other module holds a type by; types form a DAG
//! (arrays/records reference their element/field types), so reference
//! counting rather than ownership is the natural fit, mirroring how the
//! teacher's schema registry shares parsed message descriptors.

pub mod array;
pub mod number;
pub mod raw;
pub mod record;
pub mod special;
pub mod text;

use std::sync::Arc;

use crate::core::{CodaError, Result, TypeClass};
use crate::expr::Expr;

pub use array::{ArrayType, Dimension};
pub use number::{AsciiMapping, Conversion, FixedNumber, NumberClass, NumberType, ReadType};
pub use raw::RawType;
pub use record::{Field, RecordType};
pub use special::{ComplexType, SpecialType, TimeType, VsfIntegerType};
pub use text::{TextType, TextVariant};

/// Shared handle to a static type. Types are built bottom-up and never
/// mutated after construction, so sharing via `Arc` rather than cloning the
/// tree is both cheap and correct.
pub type TypeRef = Arc<StaticType>;

/// A bit size that is either known at definition time or must be evaluated
/// against a cursor position (§3: "size ... may depend on prior fields").
#[derive(Debug, Clone)]
pub enum BitSize {
    Fixed(u64),
    Expression(Box<Expr>),
}

impl BitSize {
    pub fn as_fixed(&self) -> Option<u64> {
        match self {
            BitSize::Fixed(n) => Some(*n),
            BitSize::Expression(_) => None,
        }
    }
}

/// The static type system's six variants (§3 Static Type).
#[derive(Debug, Clone)]
pub enum StaticType {
    Number(NumberType),
    Text(TextType),
    Raw(RawType),
    Array(ArrayType),
    Record(RecordType),
    Special(SpecialType),
}

impl StaticType {
    /// The coarse type-class tag (§4.8 `get_type_class`).
    pub fn type_class(&self) -> TypeClass {
        match self {
            StaticType::Number(_) => TypeClass::Number,
            StaticType::Text(_) => TypeClass::Text,
            StaticType::Raw(_) => TypeClass::Raw,
            StaticType::Array(_) => TypeClass::Array,
            StaticType::Record(_) => TypeClass::Record,
            StaticType::Special(_) => TypeClass::Special,
        }
    }

    /// This type's declared bit size, if statically known. Arrays report
    /// the size of one element here; use [`StaticType::static_bit_size`]
    /// for the whole-array size when every dimension is constant.
    pub fn own_bit_size(&self) -> Option<&BitSize> {
        match self {
            StaticType::Number(n) => Some(&n.bit_size),
            StaticType::Text(t) => Some(&t.bit_size),
            StaticType::Raw(r) => Some(&r.bit_size),
            StaticType::Array(_) | StaticType::Record(_) => None,
            StaticType::Special(s) => s.base_type().own_bit_size(),
        }
    }

    /// The total bit size of this type when every input it depends on
    /// (element counts, field sizes) is a compile-time constant.
    pub fn static_bit_size(&self) -> Option<u64> {
        match self {
            StaticType::Number(n) => n.bit_size.as_fixed(),
            StaticType::Text(t) => t.bit_size.as_fixed(),
            StaticType::Raw(r) => r.bit_size.as_fixed(),
            StaticType::Special(s) => s.base_type().static_bit_size(),
            StaticType::Array(a) => {
                let element_bits = a.base_type.static_bit_size()?;
                let count = a.static_num_elements()?;
                Some(element_bits * count)
            }
            StaticType::Record(r) => {
                if r.is_union {
                    // A union's occupied size is the selected field's size,
                    // not statically determinable from the type alone.
                    return None;
                }
                let mut total = 0u64;
                for field in r.fields() {
                    total += field.field_type.static_bit_size()?;
                }
                Some(total)
            }
        }
    }

    /// Validate the invariants §4.4 requires, recursing into composite
    /// types. Does not re-validate shared children more than once is not
    /// guaranteed (a DAG may visit a popular leaf type multiple times) but
    /// that is harmless since validation has no side effects.
    pub fn validate(&self) -> Result<()> {
        match self {
            StaticType::Number(n) => {
                if let Some(bit_size) = n.bit_size.as_fixed() {
                    if n.read_type.byte_size() * 8 < bit_size {
                        return Err(CodaError::data_definition_msg(format!(
                            "number read type is too narrow for a {bit_size}-bit value"
                        )));
                    }
                }
                Ok(())
            }
            StaticType::Text(_) | StaticType::Raw(_) => Ok(()),
            StaticType::Array(a) => {
                if a.dimensions.is_empty() {
                    return Err(CodaError::data_definition_msg("array type has no dimensions"));
                }
                a.base_type.validate()
            }
            StaticType::Record(r) => {
                r.validate(false)?;
                for field in r.fields() {
                    field.field_type.validate()?;
                }
                Ok(())
            }
            StaticType::Special(s) => {
                s.validate()?;
                s.base_type().validate()
            }
        }
    }
}
