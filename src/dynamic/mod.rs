// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dynamic type layer (§3 Dynamic Type, §4.7 C7).
//!
//! A [`StaticType`](crate::types::StaticType) describes shape; a
//! [`DynamicType`] is the per-product instantiation of one, carrying the
//! physical location (or, for backend-synthesized values such as a GRIB
//! section header, the already-computed [`Value`](crate::expr::Value))
//! a cursor needs to actually read it. The tree is built once when a
//! backend opens a product and is read-only afterward; cursors hold
//! `Arc` handles into it rather than owning it, the same sharing pattern
//! [`crate::types::TypeRef`] uses for static types.

use std::sync::Arc;

use crate::expr::Value;
use crate::types::TypeRef;

/// Shared handle to a dynamic type node.
pub type DynamicRef = Arc<DynamicType>;

/// Where (if anywhere) a dynamic value lives in the backing file.
#[derive(Debug, Clone, Copy)]
pub struct FilePosition {
    /// Bit offset from the start of the file, or `-1` if this value has no
    /// single file location (e.g. it was synthesized by a backend).
    pub bit_offset: i64,
    /// Occupied size in bits, if determinable without reading the value
    /// itself (text types with a terminator may leave this `None`).
    pub bit_size: Option<u64>,
}

impl FilePosition {
    pub const NONE: FilePosition = FilePosition { bit_offset: -1, bit_size: None };

    pub fn at(bit_offset: i64, bit_size: u64) -> Self {
        FilePosition { bit_offset, bit_size: Some(bit_size) }
    }
}

/// GRIB-style simple-packing parameters attached to an array whose elements
/// are computed by formula rather than expanded into a per-element tree
/// (§4.10: `value = stored * 2^binary_scale * 10^-decimal_scale + reference
/// * 10^-decimal_scale`, with an optional bitmask gating which logical
/// indices have a stored value at all).
#[derive(Debug, Clone)]
pub struct SimplePacking {
    pub reference: f64,
    pub binary_scale: i32,
    pub decimal_scale: i32,
    pub element_bit_size: u32,
    /// Bit offset of the bitmap section's data, if the field has one.
    pub bitmask_bit_offset: Option<i64>,
}

impl SimplePacking {
    pub fn decode(&self, stored: u64) -> f64 {
        let scaled = stored as f64 * 2f64.powi(self.binary_scale);
        (scaled + self.reference) * 10f64.powi(-self.decimal_scale)
    }
}

/// A scalar (Number/Text/Raw/Special) dynamic value.
#[derive(Debug, Clone)]
pub struct ScalarDynamic {
    pub static_type: TypeRef,
    pub position: FilePosition,
    /// Set when a backend computed the value itself instead of it living
    /// at a fixed file location (e.g. a CDF attribute entry value, or a
    /// GRIB section field parsed once at open time).
    pub in_memory: Option<Value>,
    /// This instance's actual attribute values, if its static type declares
    /// any (`goto_attributes` descends into this rather than the static
    /// shape alone, since two instances of the same type can carry
    /// different attribute values — a CDF variable's `FILLVAL` attribute
    /// entry, for example, is per-variable).
    pub attributes: Option<DynamicRef>,
}

/// An array dynamic value. Elements are either stored explicitly (when
/// each element's own dynamic type can differ, as in a CDF record-varying
/// variable's record array) or computed uniformly from `element_bit_size`
/// plus an optional [`SimplePacking`] (as GRIB fields are).
#[derive(Debug, Clone)]
pub struct ArrayDynamic {
    pub static_type: TypeRef,
    pub num_elements: u64,
    pub bit_offset: i64,
    pub element_bit_size: u64,
    pub elements: Option<Vec<DynamicRef>>,
    pub packing: Option<SimplePacking>,
    pub attributes: Option<DynamicRef>,
}

impl ArrayDynamic {
    /// Bit offset of `index`'s data when elements are computed uniformly.
    /// Callers must check `elements` first when it is `Some`.
    pub fn element_bit_offset(&self, index: u64) -> i64 {
        self.bit_offset + (index * self.element_bit_size) as i64
    }
}

/// A record dynamic value: one slot per field of the static record type, in
/// the same order, with `None` marking a field absent in this instance
/// (optional field not present, or union member not selected).
#[derive(Debug, Clone)]
pub struct RecordDynamic {
    pub static_type: TypeRef,
    pub fields: Vec<Option<DynamicRef>>,
    pub attributes: Option<DynamicRef>,
}

impl RecordDynamic {
    pub fn field(&self, index: usize) -> Option<&DynamicRef> {
        self.fields.get(index).and_then(|f| f.as_ref())
    }

    pub fn is_field_available(&self, index: usize) -> bool {
        matches!(self.fields.get(index), Some(Some(_)))
    }
}

/// The dynamic-type tree node (§4.7).
#[derive(Debug, Clone)]
pub enum DynamicType {
    Scalar(ScalarDynamic),
    Array(ArrayDynamic),
    Record(RecordDynamic),
}

impl DynamicType {
    pub fn static_type(&self) -> &TypeRef {
        match self {
            DynamicType::Scalar(s) => &s.static_type,
            DynamicType::Array(a) => &a.static_type,
            DynamicType::Record(r) => &r.static_type,
        }
    }

    pub fn scalar(static_type: TypeRef, position: FilePosition) -> DynamicRef {
        Arc::new(DynamicType::Scalar(ScalarDynamic { static_type, position, in_memory: None, attributes: None }))
    }

    pub fn in_memory_scalar(static_type: TypeRef, value: Value) -> DynamicRef {
        Arc::new(DynamicType::Scalar(ScalarDynamic {
            static_type,
            position: FilePosition::NONE,
            in_memory: Some(value),
            attributes: None,
        }))
    }

    pub fn as_scalar(&self) -> Option<&ScalarDynamic> {
        match self {
            DynamicType::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayDynamic> {
        match self {
            DynamicType::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordDynamic> {
        match self {
            DynamicType::Record(r) => Some(r),
            _ => None,
        }
    }
}
