// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Array static type (§3 Static Type, §4.4 C4).

use crate::core::ArrayOrdering;
use crate::expr::Expr;
use crate::types::TypeRef;

/// One array dimension: either a compile-time constant or an expression
/// evaluated per-product at open time.
#[derive(Debug, Clone)]
pub enum Dimension {
    Constant(u64),
    Expression(Box<Expr>),
}

/// The `Array` static type variant.
#[derive(Debug, Clone)]
pub struct ArrayType {
    pub base_type: TypeRef,
    pub dimensions: Vec<Dimension>,
    pub ordering: ArrayOrdering,
    pub attributes: Option<TypeRef>,
}

impl ArrayType {
    pub fn new(base_type: TypeRef, dimensions: Vec<Dimension>) -> Self {
        ArrayType {
            base_type,
            dimensions,
            ordering: ArrayOrdering::C,
            attributes: None,
        }
    }

    pub fn with_ordering(mut self, ordering: ArrayOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_attributes(mut self, attributes: TypeRef) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Total element count, if every dimension is a compile-time constant.
    pub fn static_num_elements(&self) -> Option<u64> {
        self.dimensions
            .iter()
            .map(|d| match d {
                Dimension::Constant(n) => Some(*n),
                Dimension::Expression(_) => None,
            })
            .try_fold(1u64, |acc, d| d.map(|d| acc * d))
    }
}
