// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Special static type: time, complex, and vsf-integer compositions built
//! on top of plain Number children (§3 Static Type, §4.4 C4).

use crate::core::{CodaError, Result};
use crate::expr::Expr;
use crate::types::number::NumberClass;
use crate::types::{NumberType, StaticType, TypeRef};

/// A time value: a base number (usually a double) whose raw reading is
/// mapped to seconds-since-2000-01-01T00:00:00 UTC by `unit_expr` (§3).
#[derive(Debug, Clone)]
pub struct TimeType {
    pub base: TypeRef,
    pub unit_expr: Box<Expr>,
}

impl TimeType {
    pub fn new(base: TypeRef, unit_expr: Expr) -> Self {
        TimeType { base, unit_expr: Box::new(unit_expr) }
    }
}

/// A complex value: a pair of compatible numeric components.
#[derive(Debug, Clone)]
pub struct ComplexType {
    pub real: TypeRef,
    pub imag: TypeRef,
}

impl ComplexType {
    pub fn new(real: TypeRef, imag: TypeRef) -> Self {
        ComplexType { real, imag }
    }
}

/// A variable-scale-factor integer: `base * 10^-scale_factor`, with `base`
/// and `scale_factor` both plain integer Number children.
#[derive(Debug, Clone)]
pub struct VsfIntegerType {
    pub base: TypeRef,
    pub scale_factor: TypeRef,
    pub unit: Option<String>,
}

impl VsfIntegerType {
    pub fn new(base: TypeRef, scale_factor: TypeRef) -> Self {
        VsfIntegerType { base, scale_factor, unit: None }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// The `Special` static type variant.
#[derive(Debug, Clone)]
pub enum SpecialType {
    Time(TimeType),
    Complex(ComplexType),
    VsfInteger(VsfIntegerType),
}

fn number_class_of(t: &StaticType) -> Option<NumberClass> {
    match t {
        StaticType::Number(n) => Some(n.class),
        _ => None,
    }
}

impl SpecialType {
    /// Validate the per-variant invariants of §4.4: `Time` needs a numeric
    /// base, `Complex` needs two numeric components of the same class, and
    /// `VsfInteger` needs two integer components.
    pub fn validate(&self) -> Result<()> {
        match self {
            SpecialType::Time(t) => {
                if number_class_of(&t.base).is_none() {
                    return Err(CodaError::data_definition_msg("time type base is not a number"));
                }
                Ok(())
            }
            SpecialType::Complex(c) => {
                let real_class = number_class_of(&c.real);
                let imag_class = number_class_of(&c.imag);
                match (real_class, imag_class) {
                    (Some(r), Some(i)) if r == i => Ok(()),
                    (Some(_), Some(_)) => {
                        Err(CodaError::data_definition_msg("complex type components have mismatched number classes"))
                    }
                    _ => Err(CodaError::data_definition_msg("complex type components are not numbers")),
                }
            }
            SpecialType::VsfInteger(v) => {
                let base_is_int = number_class_of(&v.base) == Some(NumberClass::Integer);
                let scale_is_int = number_class_of(&v.scale_factor) == Some(NumberClass::Integer);
                if !base_is_int || !scale_is_int {
                    return Err(CodaError::data_definition_msg(
                        "vsf-integer type requires an integer base and an integer scale factor",
                    ));
                }
                Ok(())
            }
        }
    }

    /// The underlying type used for navigation with the base type exposed
    /// (`use_base_type_of_special_type`, §4.8).
    pub fn base_type(&self) -> &TypeRef {
        match self {
            SpecialType::Time(t) => &t.base,
            SpecialType::Complex(c) => &c.real,
            SpecialType::VsfInteger(v) => &v.base,
        }
    }
}
