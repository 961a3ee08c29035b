// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Cursor navigation API (§3 Cursor, §4.8 C8).
//!
//! A [`Cursor`] is a bounded stack of [`Frame`]s, each a position within
//! the dynamic-type tree a backend built for one product. Every `goto_*`
//! method either lands the cursor at a new, valid position or leaves it
//! exactly where it was: navigation first computes the destination frame,
//! then pushes/replaces it, so a failed navigation can never corrupt the
//! stack.

pub mod path;

use std::sync::Arc;

use crate::bitio::{read_bits, read_bytes, ByteSource};
use crate::core::{ArrayOrdering, CodaError, Format, Options, Result, TypeClass};
use crate::dynamic::{ArrayDynamic, DynamicRef, DynamicType, FilePosition, RecordDynamic, ScalarDynamic, SimplePacking};
use crate::expr::{self, EvalContext, PathStep, ResolvedStep, Value};
use crate::types::number::{NumberClass, NumberType, ReadType};
use crate::types::{RecordType, StaticType, TypeRef};

/// Maximum nesting depth a cursor can navigate to (§3).
pub const MAX_DEPTH: usize = 32;

/// One position in the navigation stack.
#[derive(Debug, Clone)]
struct Frame {
    dynamic: DynamicRef,
    /// Index within the parent array/record, or `-1` for the root frame
    /// and for an attributes frame.
    index: i32,
}

/// A navigation cursor over one product's dynamic-type tree.
pub struct Cursor {
    source: Arc<dyn ByteSource>,
    filename: String,
    format: Format,
    stack: Vec<Frame>,
    /// Set by `use_base_type_of_special_type`, cleared on the next
    /// navigation; while set, type introspection at the current position
    /// reports the special type's base type instead.
    bypass_special: bool,
}

impl Cursor {
    /// Construct a cursor with no position set. Call [`Cursor::set_product`]
    /// before navigating.
    pub fn new(source: Arc<dyn ByteSource>, filename: impl Into<String>, format: Format) -> Self {
        Cursor { source, filename: filename.into(), format, stack: Vec::new(), bypass_special: false }
    }

    /// Set (or reset) the cursor to the root of a product's dynamic type
    /// tree.
    pub fn set_product(&mut self, root: DynamicRef) {
        self.stack.clear();
        self.stack.push(Frame { dynamic: root, index: -1 });
        self.bypass_special = false;
    }

    fn top(&self) -> Result<&Frame> {
        self.stack.last().ok_or_else(|| CodaError::invalid_argument("cursor has no product set"))
    }

    fn current(&self) -> Result<&DynamicRef> {
        Ok(&self.top()?.dynamic)
    }

    fn push(&mut self, dynamic: DynamicRef, index: i32) -> Result<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(CodaError::invalid_argument(format!("cursor navigation exceeds maximum depth {MAX_DEPTH}")));
        }
        self.stack.push(Frame { dynamic, index });
        self.bypass_special = false;
        Ok(())
    }

    /// Current static type, following through a `Special` wrapper unless
    /// `use_base_type_of_special_type` (or the global option) is active.
    fn effective_static_type(&self) -> Result<TypeRef> {
        let static_type = self.current()?.static_type().clone();
        if self.bypass_special || Options::current().bypass_special_types {
            if let StaticType::Special(s) = static_type.as_ref() {
                return Ok(s.base_type().clone());
            }
        }
        Ok(static_type)
    }

    // ---- depth / index --------------------------------------------------

    pub fn get_depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    pub fn get_index(&self) -> Result<i32> {
        Ok(self.top()?.index)
    }

    /// The `index` stored in the frame at `depth` (0 is the root frame).
    /// Used by [`crate::matcher::TreeNode`] to walk a cursor's position
    /// level by level without re-navigating it.
    pub(crate) fn frame_index_at(&self, depth: usize) -> i32 {
        self.stack[depth].index
    }

    // ---- record navigation ------------------------------------------------

    fn as_record(&self) -> Result<&RecordDynamic> {
        match self.current()?.as_ref() {
            DynamicType::Record(r) => Ok(r),
            other => Err(CodaError::InvalidType {
                expected: "record".into(),
                actual: other.static_type().type_class().to_string(),
            }),
        }
    }

    fn as_record_static(&self) -> Result<&RecordType> {
        match self.current()?.static_type().as_ref() {
            StaticType::Record(r) => Ok(r),
            other => Err(CodaError::InvalidType { expected: "record".into(), actual: other.type_class().to_string() }),
        }
    }

    pub fn goto_record_field_by_index(&mut self, index: usize) -> Result<()> {
        let record = self.as_record()?;
        if index >= record.fields.len() {
            return Err(CodaError::ArrayOutOfBounds { index: index as i64, num_elements: record.fields.len() as i64 });
        }
        let field = record.fields[index]
            .clone()
            .ok_or_else(|| CodaError::invalid_argument(format!("field {index} is not available")))?;
        self.push(field, index as i32)
    }

    pub fn goto_record_field_by_name(&mut self, name: &str) -> Result<()> {
        let index = self.get_record_field_index_from_name(name)?;
        self.goto_record_field_by_index(index)
    }

    pub fn goto_first_record_field(&mut self) -> Result<()> {
        self.goto_record_field_by_index(0)
    }

    pub fn goto_next_record_field(&mut self) -> Result<()> {
        let parent_index = self.top()?.index;
        if parent_index < 0 {
            return Err(CodaError::invalid_argument("cursor is not positioned on a record field"));
        }
        self.stack.pop();
        self.goto_record_field_by_index(parent_index as usize + 1)
    }

    pub fn goto_available_union_field(&mut self) -> Result<()> {
        let record = self.as_record()?;
        let index = record
            .fields
            .iter()
            .position(|f| f.is_some())
            .ok_or_else(|| CodaError::invalid_argument("union has no available field"))?;
        self.goto_record_field_by_index(index)
    }

    pub fn get_record_field_index_from_name(&self, name: &str) -> Result<usize> {
        let static_record = self.as_record_static()?;
        static_record
            .field_index_by_name(name)
            .or_else(|| static_record.field_index_by_real_name(name))
            .ok_or_else(|| CodaError::InvalidName { name: name.to_string() })
    }

    pub fn get_record_field_available_status(&self, index: usize) -> Result<bool> {
        Ok(self.as_record()?.is_field_available(index))
    }

    pub fn get_available_union_field_index(&self) -> Result<Option<usize>> {
        Ok(self.as_record()?.fields.iter().position(|f| f.is_some()))
    }

    // ---- array navigation --------------------------------------------------

    fn as_array(&self) -> Result<&ArrayDynamic> {
        match self.current()?.as_ref() {
            DynamicType::Array(a) => Ok(a),
            other => Err(CodaError::InvalidType {
                expected: "array".into(),
                actual: other.static_type().type_class().to_string(),
            }),
        }
    }

    pub fn get_num_elements(&self) -> Result<u64> {
        Ok(self.as_array()?.num_elements)
    }

    /// Declared dimensions, in the array's own (row-major/Fortran) order.
    pub fn get_array_dim(&self) -> Result<Vec<i64>> {
        let array = self.as_array()?;
        match array.static_type.as_ref() {
            StaticType::Array(a) => Ok(a
                .dimensions
                .iter()
                .map(|d| match d {
                    crate::types::Dimension::Constant(n) => *n as i64,
                    crate::types::Dimension::Expression(_) => -1,
                })
                .collect()),
            _ => Err(CodaError::invalid_argument("array dynamic type has a non-array static type")),
        }
    }

    fn element_by_index(&self, array: &ArrayDynamic, index: u64) -> Result<(DynamicRef, FilePosition)> {
        if Options::current().perform_boundary_checks && index >= array.num_elements {
            return Err(CodaError::ArrayOutOfBounds { index: index as i64, num_elements: array.num_elements as i64 });
        }
        if let Some(elements) = &array.elements {
            return Ok((elements[index as usize].clone(), FilePosition::NONE));
        }
        let element_type = match array.static_type.as_ref() {
            StaticType::Array(arr) => arr.base_type.clone(),
            _ => array.static_type.clone(),
        };
        if let Some(packing) = &array.packing {
            let value = self.decode_packed_element(array, packing, index)?;
            return Ok((DynamicType::in_memory_scalar(element_type, value), FilePosition::NONE));
        }
        let bit_offset = array.element_bit_offset(index);
        let position = FilePosition::at(bit_offset, array.element_bit_size);
        Ok((DynamicType::scalar(element_type, position), position))
    }

    /// Decode one element of a GRIB-style simply-packed array (§4.10):
    /// `stored` is read as a plain unsigned integer of `element_bit_size`
    /// bits, then mapped through `packing`. A bitmasked-out element (the
    /// bitmap bit at `index` is 0) reads as NaN rather than a stored value,
    /// since no value was transmitted for it; a zero-bit-size packing (a
    /// constant field) always reads as the reference value directly.
    fn decode_packed_element(&self, array: &ArrayDynamic, packing: &SimplePacking, index: u64) -> Result<Value> {
        if packing.element_bit_size == 0 {
            return Ok(Value::Float(packing.reference));
        }
        let element_index = match packing.bitmask_bit_offset {
            None => index,
            Some(bitmask_bit_offset) => {
                let bitmask_byte_offset = (bitmask_bit_offset as u64) / 8;
                let byte_index = index / 8;
                let bit_in_byte = index % 8;
                let own_byte = read_bytes(self.source.as_ref(), bitmask_byte_offset + byte_index, 1)?[0];
                if (own_byte >> (7 - bit_in_byte)) & 1 == 0 {
                    return Ok(Value::Float(f64::NAN));
                }
                let mut set_before = 0u64;
                if byte_index > 0 {
                    let prior = read_bytes(self.source.as_ref(), bitmask_byte_offset, byte_index)?;
                    set_before += prior.iter().map(|b| b.count_ones() as u64).sum::<u64>();
                }
                for bit in 0..bit_in_byte {
                    set_before += ((own_byte >> (7 - bit)) & 1) as u64;
                }
                set_before
            }
        };
        let bit_offset = array.bit_offset + (element_index * packing.element_bit_size as u64) as i64;
        let raw_bits = read_bits(self.source.as_ref(), bit_offset as u64, packing.element_bit_size as u64)?;
        let stored = raw_bits.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        Ok(Value::Float(packing.decode(stored)))
    }

    /// Navigate to one array element by linear index.
    pub fn goto_array_element_by_index(&mut self, index: u64) -> Result<()> {
        let array = self.as_array()?;
        let (element, _) = self.element_by_index(array, index)?;
        self.push(element, index as i32)
    }

    /// Navigate to one array element by per-dimension subscripts, honoring
    /// the array's declared ordering.
    pub fn goto_array_element(&mut self, subscripts: &[i64]) -> Result<()> {
        let dims = self.get_array_dim()?;
        if subscripts.len() != dims.len() {
            return Err(CodaError::ArrayNumDimsMismatch { expected: dims.len() as i32, actual: subscripts.len() as i32 });
        }
        let ordering = match self.current()?.static_type().as_ref() {
            StaticType::Array(a) => a.ordering,
            _ => ArrayOrdering::C,
        };
        let mut linear: u64 = 0;
        match ordering {
            ArrayOrdering::C => {
                for (dim, sub) in dims.iter().zip(subscripts.iter()) {
                    linear = linear * (*dim as u64) + (*sub as u64);
                }
            }
            ArrayOrdering::Fortran => {
                for (dim, sub) in dims.iter().zip(subscripts.iter()).rev() {
                    linear = linear * (*dim as u64) + (*sub as u64);
                }
            }
        }
        self.goto_array_element_by_index(linear)
    }

    pub fn goto_first_array_element(&mut self) -> Result<()> {
        self.goto_array_element_by_index(0)
    }

    pub fn goto_next_array_element(&mut self) -> Result<()> {
        let parent_index = self.top()?.index;
        if parent_index < 0 {
            return Err(CodaError::invalid_argument("cursor is not positioned on an array element"));
        }
        self.stack.pop();
        self.goto_array_element_by_index(parent_index as u64 + 1)
    }

    // ---- attributes / parent / root ---------------------------------------

    pub fn goto_attributes(&mut self) -> Result<()> {
        let declared = match self.current()?.static_type().as_ref() {
            StaticType::Number(n) => n.attributes.clone(),
            StaticType::Text(t) => t.attributes.clone(),
            StaticType::Raw(r) => r.attributes.clone(),
            StaticType::Array(a) => a.attributes.clone(),
            StaticType::Record(r) => r.attributes.clone(),
            StaticType::Special(_) => None,
        };
        // The static type only says attributes are shaped like `declared`;
        // the actual values live on this instance, since two products can
        // give the same variable different attribute entries.
        let instance_attributes = match self.current()?.as_ref() {
            DynamicType::Scalar(s) => s.attributes.clone(),
            DynamicType::Array(a) => a.attributes.clone(),
            DynamicType::Record(r) => r.attributes.clone(),
        };
        let dynamic = instance_attributes.unwrap_or_else(|| {
            let empty_type = declared.unwrap_or_else(|| Arc::new(StaticType::Record(RecordType::new())));
            DynamicType::scalar(empty_type, FilePosition::NONE)
        });
        self.push(dynamic, -1)
    }

    pub fn goto_parent(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(CodaError::invalid_argument("cursor is already at the product root"));
        }
        self.stack.pop();
        Ok(())
    }

    pub fn goto_root(&mut self) {
        self.stack.truncate(1);
        self.bypass_special = false;
    }

    pub fn use_base_type_of_special_type(&mut self) {
        self.bypass_special = true;
    }

    /// Navigate by a path string using the same grammar as expressions
    /// (`./a/b[2]@unit`, `../c`, `/d`).
    pub fn goto(&mut self, path_str: &str) -> Result<()> {
        let parsed = path::parse_goto_path(path_str)?;
        let saved_len = self.stack.len();
        if parsed.absolute {
            self.goto_root();
        }
        for step in &parsed.steps {
            if let Err(e) = self.apply_path_step(step) {
                self.stack.truncate(saved_len);
                return Err(e);
            }
        }
        Ok(())
    }

    fn apply_path_step(&mut self, step: &PathStep) -> Result<()> {
        match step {
            PathStep::Field(name) => self.goto_record_field_by_name(name),
            PathStep::Attribute(name) => {
                self.goto_attributes()?;
                self.goto_record_field_by_name(name)
            }
            PathStep::Parent => self.goto_parent(),
            PathStep::Index(index_expr) => {
                let value = expr::eval(index_expr, Some(self as &dyn EvalContext))?;
                let index = value.as_int().ok_or_else(|| CodaError::expression_eval("array index is not an integer"))?;
                self.goto_array_element_by_index(index as u64)
            }
        }
    }

    // ---- type introspection ------------------------------------------------

    pub fn get_type_class(&self) -> Result<TypeClass> {
        Ok(self.effective_static_type()?.type_class())
    }

    pub fn get_type(&self) -> Result<TypeRef> {
        self.effective_static_type()
    }

    pub fn get_format(&self) -> Format {
        self.format
    }

    /// The special-type kind at the current position, if any
    /// (`use_base_type_of_special_type` does not affect this query).
    pub fn get_special_type(&self) -> Option<crate::types::SpecialType> {
        match self.current().ok()?.static_type().as_ref() {
            StaticType::Special(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn get_read_type(&self) -> Result<ReadType> {
        match self.effective_static_type()?.as_ref() {
            StaticType::Number(n) => Ok(n.read_type),
            other => Err(CodaError::InvalidType { expected: "number".into(), actual: other.type_class().to_string() }),
        }
    }

    pub fn get_bit_size(&self) -> Result<i64> {
        match self.current()?.as_ref() {
            DynamicType::Scalar(s) => s
                .position
                .bit_size
                .map(|n| n as i64)
                .ok_or_else(|| CodaError::product("bit size is not known without reading the value")),
            DynamicType::Array(a) => {
                let element_bits = match a.static_type.as_ref() {
                    StaticType::Array(arr) => arr.base_type.static_bit_size().unwrap_or(a.element_bit_size),
                    _ => a.element_bit_size,
                };
                Ok(element_bits as i64 * a.num_elements as i64)
            }
            DynamicType::Record(_) => {
                self.current()?.static_type().static_bit_size().map(|n| n as i64).ok_or_else(|| {
                    CodaError::product("record bit size depends on a union selection or variable-length field")
                })
            }
        }
    }

    pub fn get_byte_size(&self) -> Result<i64> {
        Ok((self.get_bit_size()? + 7) / 8)
    }

    pub fn get_file_bit_offset(&self) -> Result<i64> {
        match self.current()?.as_ref() {
            DynamicType::Scalar(s) => Ok(s.position.bit_offset),
            DynamicType::Array(a) => Ok(a.bit_offset),
            DynamicType::Record(r) => Ok(r
                .fields
                .iter()
                .flatten()
                .next()
                .map(|f| match f.as_ref() {
                    DynamicType::Scalar(s) => s.position.bit_offset,
                    DynamicType::Array(a) => a.bit_offset,
                    DynamicType::Record(_) => -1,
                })
                .unwrap_or(-1)),
        }
    }

    pub fn get_file_byte_offset(&self) -> Result<i64> {
        let bit_offset = self.get_file_bit_offset()?;
        if bit_offset < 0 {
            return Ok(-1);
        }
        Ok(bit_offset / 8)
    }

    pub fn get_string_length(&self) -> Result<i64> {
        match self.effective_static_type()?.as_ref() {
            StaticType::Text(_) => {
                let value = self.read_value()?;
                Ok(value.as_bytes().map(|b| b.len() as i64).unwrap_or(0))
            }
            other => Err(CodaError::InvalidType { expected: "text".into(), actual: other.type_class().to_string() }),
        }
    }

    // ---- reads --------------------------------------------------------------

    fn as_scalar(&self) -> Result<&ScalarDynamic> {
        match self.current()?.as_ref() {
            DynamicType::Scalar(s) => Ok(s),
            other => Err(CodaError::InvalidType {
                expected: "scalar".into(),
                actual: other.static_type().type_class().to_string(),
            }),
        }
    }

    pub fn read_bits_raw(&self, bit_length: u64) -> Result<Vec<u8>> {
        let scalar = self.as_scalar()?;
        let bit_offset = scalar.position.bit_offset;
        if bit_offset < 0 {
            return Err(CodaError::invalid_argument("no file position to read bits from"));
        }
        read_bits(self.source.as_ref(), bit_offset as u64, bit_length)
    }

    pub fn read_bytes_raw(&self, byte_length: u64) -> Result<Vec<u8>> {
        let scalar = self.as_scalar()?;
        let bit_offset = scalar.position.bit_offset;
        if bit_offset < 0 {
            return Err(CodaError::invalid_argument("no file position to read bytes from"));
        }
        read_bytes(self.source.as_ref(), (bit_offset / 8) as u64, byte_length)
    }

    fn decode_number(&self, n: &NumberType, position: FilePosition) -> Result<Value> {
        let bit_size = position
            .bit_size
            .ok_or_else(|| CodaError::product("number has no resolved bit size"))?;
        let byte_width = n.read_type.byte_size();
        let raw_bits: Vec<u8> = if bit_size == byte_width * 8 && position.bit_offset % 8 == 0 {
            let mut bytes = read_bytes(self.source.as_ref(), (position.bit_offset / 8) as u64, byte_width)?;
            if n.little_endian {
                bytes.reverse();
            }
            bytes
        } else {
            read_bits(self.source.as_ref(), position.bit_offset as u64, bit_size)?
        };
        let raw_int = raw_bits.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);

        let numeric = match n.read_type {
            ReadType::F32 => f32::from_bits(raw_int as u32) as f64,
            ReadType::F64 => f64::from_bits(raw_int),
            _ => {
                if is_signed(n.read_type) {
                    sign_extend(raw_int, bit_size) as f64
                } else {
                    raw_int as f64
                }
            }
        };

        let convert = Options::current().perform_conversions;
        if convert {
            if let Some(conversion) = &n.conversion {
                return Ok(Value::Float(conversion.apply(numeric)));
            }
        }
        match n.class {
            NumberClass::Integer => Ok(Value::Int(numeric as i64)),
            NumberClass::Real => Ok(Value::Float(numeric)),
        }
    }

    fn decode_text(&self, position: FilePosition) -> Result<Value> {
        let bit_size = position.bit_size.ok_or_else(|| CodaError::product("text has no resolved length"))?;
        let bytes = read_bits(self.source.as_ref(), position.bit_offset as u64, bit_size)?;
        Ok(Value::String(Arc::from(bytes.into_boxed_slice())))
    }

    /// Read the scalar value at the current position in its most natural
    /// form. Used both by typed convenience readers below and by the
    /// expression evaluator (`EvalContext::read_value`).
    pub fn read_value(&self) -> Result<Value> {
        let scalar = self.as_scalar()?;
        if let Some(value) = &scalar.in_memory {
            return Ok(value.clone());
        }
        match self.effective_static_type()?.as_ref() {
            StaticType::Number(n) => self.decode_number(n, scalar.position),
            StaticType::Text(_) => self.decode_text(scalar.position),
            StaticType::Raw(_) => {
                let bit_size = scalar.position.bit_size.ok_or_else(|| CodaError::product("raw has no resolved length"))?;
                let bytes = read_bits(self.source.as_ref(), scalar.position.bit_offset as u64, bit_size)?;
                Ok(Value::String(Arc::from(bytes.into_boxed_slice())))
            }
            StaticType::Special(special) => self.decode_special(special, scalar.position),
            StaticType::Array(_) | StaticType::Record(_) => {
                Err(CodaError::invalid_argument("type is not a scalar value"))
            }
        }
    }

    /// Decode a `Special` scalar by reading its base representation at
    /// `position` and, for `Time`, applying the conversion expression with
    /// `.` bound to that raw base value (CDF's EPOCH/TIME_TT2000 variables,
    /// for instance, are a plain double/int64 wrapped this way).
    fn decode_special(&self, special: &crate::types::SpecialType, position: FilePosition) -> Result<Value> {
        match special {
            crate::types::SpecialType::Time(t) => {
                let base_value = match t.base.as_ref() {
                    StaticType::Number(n) => self.decode_number(n, position)?,
                    _ => return Err(CodaError::data_definition_msg("time type base is not a number")),
                };
                expr::eval(&t.unit_expr, Some(&BaseValueContext(base_value)))
            }
            crate::types::SpecialType::Complex(_) | crate::types::SpecialType::VsfInteger(_) => Err(
                CodaError::invalid_argument("reading this special type directly requires use_base_type_of_special_type"),
            ),
        }
    }

    pub fn read_int64(&self) -> Result<i64> {
        self.read_value()?.as_int().ok_or_else(|| CodaError::expression_eval("value is not an integer"))
    }

    pub fn read_double(&self) -> Result<f64> {
        self.read_value()?.as_float().ok_or_else(|| CodaError::expression_eval("value is not numeric"))
    }

    pub fn read_string(&self) -> Result<String> {
        let bytes = self
            .read_value()?
            .as_bytes()
            .ok_or_else(|| CodaError::expression_eval("value is not a string"))?
            .to_vec();
        let terminated = bytes.iter().position(|&b| b == 0).map(|i| &bytes[..i]).unwrap_or(&bytes[..]);
        Ok(String::from_utf8_lossy(terminated).into_owned())
    }

    /// Read every element of the current array position into `Value`s, in
    /// the array's stored linear order.
    pub fn read_value_array(&mut self) -> Result<Vec<Value>> {
        let count = self.get_num_elements()?;
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count {
            self.goto_array_element_by_index(i)?;
            values.push(self.read_value()?);
            self.goto_parent()?;
        }
        Ok(values)
    }

    /// Read a contiguous sub-range `[offset, offset+length)` of the current
    /// array position.
    pub fn read_value_partial_array(&mut self, offset: u64, length: u64) -> Result<Vec<Value>> {
        let count = self.get_num_elements()?;
        if offset + length > count {
            return Err(CodaError::ArrayOutOfBounds { index: (offset + length) as i64, num_elements: count as i64 });
        }
        let mut values = Vec::with_capacity(length as usize);
        for i in offset..offset + length {
            self.goto_array_element_by_index(i)?;
            values.push(self.read_value()?);
            self.goto_parent()?;
        }
        Ok(values)
    }
}

/// A one-value evaluation context for a Special type's conversion
/// expression: `.` always resolves to the already-decoded base value,
/// nothing else is available.
struct BaseValueContext(Value);

impl EvalContext for BaseValueContext {
    fn file_size(&self) -> Result<i64> {
        Err(CodaError::expression_eval("file_size() is not available in a type conversion expression"))
    }

    fn filename(&self) -> Result<String> {
        Err(CodaError::expression_eval("filename() is not available in a type conversion expression"))
    }

    fn resolve_identifier(&self, name: &str) -> Result<Value> {
        Err(CodaError::InvalidName { name: name.to_string() })
    }

    fn navigate(&self, steps: &[ResolvedStep]) -> Result<Box<dyn EvalContext + '_>> {
        if steps.is_empty() {
            Ok(Box::new(BaseValueContext(self.0.clone())))
        } else {
            Err(CodaError::expression_eval("type conversion expression cannot navigate away from its own value"))
        }
    }

    fn read_value(&self) -> Result<Value> {
        Ok(self.0.clone())
    }

    fn read_bytes(&self, _len: i64) -> Result<Vec<u8>> {
        Err(CodaError::expression_eval("bytes() is not available in a type conversion expression"))
    }
}

fn is_signed(read_type: ReadType) -> bool {
    matches!(read_type, ReadType::I8 | ReadType::I16 | ReadType::I32 | ReadType::I64)
}

fn sign_extend(raw: u64, bit_size: u64) -> i64 {
    if bit_size >= 64 {
        return raw as i64;
    }
    let sign_bit = 1u64 << (bit_size - 1);
    if raw & sign_bit != 0 {
        (raw as i64) - (1i64 << bit_size)
    } else {
        raw as i64
    }
}

impl EvalContext for Cursor {
    fn file_size(&self) -> Result<i64> {
        Ok(self.source.size() as i64)
    }

    fn filename(&self) -> Result<String> {
        Ok(self.filename.clone())
    }

    fn resolve_identifier(&self, name: &str) -> Result<Value> {
        Err(CodaError::InvalidName { name: name.to_string() })
    }

    fn navigate(&self, steps: &[ResolvedStep]) -> Result<Box<dyn EvalContext + '_>> {
        let mut clone = Cursor {
            source: self.source.clone(),
            filename: self.filename.clone(),
            format: self.format,
            stack: self.stack.clone(),
            bypass_special: self.bypass_special,
        };
        for step in steps {
            match step {
                ResolvedStep::Field(name) => clone.goto_record_field_by_name(name)?,
                ResolvedStep::Index(i) => clone.goto_array_element_by_index(*i as u64)?,
                ResolvedStep::Attribute(name) => {
                    clone.goto_attributes()?;
                    clone.goto_record_field_by_name(name)?;
                }
                ResolvedStep::Parent => clone.goto_parent()?,
            }
        }
        Ok(Box::new(clone))
    }

    fn read_value(&self) -> Result<Value> {
        Cursor::read_value(self)
    }

    fn read_bytes(&self, len: i64) -> Result<Vec<u8>> {
        self.read_bytes_raw(len as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::MemorySource;
    use crate::types::number::{NumberClass as NC, NumberType as NT, ReadType as RT};

    fn cursor_over(bytes: Vec<u8>) -> (Cursor, Arc<dyn ByteSource>) {
        let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(bytes));
        let cursor = Cursor::new(source.clone(), "test.bin", Format::Binary);
        (cursor, source)
    }

    #[test]
    fn reads_big_endian_u32_scalar() {
        let (mut cursor, source) = cursor_over(vec![0x00, 0x00, 0x01, 0x00]);
        let number = NT::new(NC::Integer, RT::U32, 32);
        let static_type: TypeRef = Arc::new(StaticType::Number(number));
        let root = DynamicType::scalar(static_type, FilePosition::at(0, 32));
        cursor.set_product(root);
        assert_eq!(cursor.read_int64().unwrap(), 256);
        let _ = source;
    }

    #[test]
    fn reads_little_endian_u16_scalar() {
        let (mut cursor, _source) = cursor_over(vec![0x34, 0x12]);
        let number = NT::new(NC::Integer, RT::U16, 16).with_little_endian(true);
        let static_type: TypeRef = Arc::new(StaticType::Number(number));
        let root = DynamicType::scalar(static_type, FilePosition::at(0, 16));
        cursor.set_product(root);
        assert_eq!(cursor.read_int64().unwrap(), 0x1234);
    }

    #[test]
    fn record_navigation_by_name_and_index() {
        let (mut cursor, _source) = cursor_over(vec![0, 0, 0, 7]);
        let number = NT::new(NC::Integer, RT::I32, 32);
        let number_type: TypeRef = Arc::new(StaticType::Number(number));
        let mut record = RecordType::new();
        record.add_field(crate::types::Field::new("a", number_type.clone())).unwrap();
        let field_dynamic = DynamicType::scalar(number_type, FilePosition::at(0, 32));
        let record_dynamic = Arc::new(DynamicType::Record(RecordDynamic {
            static_type: Arc::new(StaticType::Record(record)),
            fields: vec![Some(field_dynamic)],
            attributes: None,
        }));
        cursor.set_product(record_dynamic);
        cursor.goto_record_field_by_name("a").unwrap();
        assert_eq!(cursor.read_int64().unwrap(), 7);
        cursor.goto_parent().unwrap();
        assert_eq!(cursor.get_depth(), 0);
    }

    #[test]
    fn special_time_type_applies_conversion_expression() {
        use crate::types::special::{SpecialType, TimeType};

        let (mut cursor, _source) = cursor_over(vec![0, 0, 0, 0, 0, 0, 0, 10]);
        let base: TypeRef = Arc::new(StaticType::Number(NT::new(NC::Integer, RT::I64, 64)));
        let time = SpecialType::Time(TimeType::new(base, crate::expr::parse("float(.) * 2").unwrap()));
        let static_type: TypeRef = Arc::new(StaticType::Special(time));
        let root = DynamicType::scalar(static_type, FilePosition::at(0, 64));
        cursor.set_product(root);
        assert_eq!(cursor.read_double().unwrap(), 20.0);
    }

    #[test]
    fn array_navigation_respects_bounds() {
        let (mut cursor, _source) = cursor_over(vec![1, 2, 3, 4]);
        let element: TypeRef = Arc::new(StaticType::Number(NT::new(NC::Integer, RT::U8, 8)));
        let array_static = Arc::new(StaticType::Array(crate::types::ArrayType::new(
            element.clone(),
            vec![crate::types::Dimension::Constant(4)],
        )));
        let array_dynamic = Arc::new(DynamicType::Array(ArrayDynamic {
            static_type: array_static,
            num_elements: 4,
            bit_offset: 0,
            element_bit_size: 8,
            elements: None,
            packing: None,
            attributes: None,
        }));
        cursor.set_product(array_dynamic);
        cursor.goto_array_element_by_index(2).unwrap();
        assert_eq!(cursor.read_int64().unwrap(), 3);
        cursor.goto_parent().unwrap();
        assert!(cursor.goto_array_element_by_index(10).is_err());
        assert_eq!(cursor.get_depth(), 0);
    }

    #[test]
    fn simple_packed_array_applies_scale_and_reference() {
        // two packed 8-bit values: 10 and 20, scale 1, reference 5 -> 15, 25
        let (mut cursor, _source) = cursor_over(vec![10, 20]);
        let element: TypeRef = Arc::new(StaticType::Number(NT::new(NC::Real, RT::F64, 64)));
        let array_static = Arc::new(StaticType::Array(crate::types::ArrayType::new(
            element,
            vec![crate::types::Dimension::Constant(2)],
        )));
        let array_dynamic = Arc::new(DynamicType::Array(ArrayDynamic {
            static_type: array_static,
            num_elements: 2,
            bit_offset: 0,
            element_bit_size: 8,
            elements: None,
            packing: Some(SimplePacking { reference: 5.0, binary_scale: 0, decimal_scale: 0, element_bit_size: 8, bitmask_bit_offset: None }),
            attributes: None,
        }));
        cursor.set_product(array_dynamic);
        cursor.goto_array_element_by_index(0).unwrap();
        assert_eq!(cursor.read_double().unwrap(), 15.0);
        cursor.goto_parent().unwrap();
        cursor.goto_array_element_by_index(1).unwrap();
        assert_eq!(cursor.read_double().unwrap(), 25.0);
    }

    #[test]
    fn simple_packed_array_honors_bitmask() {
        // bitmap byte 0b1010_0000 gates 8 elements; packed values 7, 9 follow immediately.
        let (mut cursor, _source) = cursor_over(vec![0b1010_0000, 7, 9]);
        let element: TypeRef = Arc::new(StaticType::Number(NT::new(NC::Real, RT::F64, 64)));
        let array_static = Arc::new(StaticType::Array(crate::types::ArrayType::new(
            element,
            vec![crate::types::Dimension::Constant(8)],
        )));
        let array_dynamic = Arc::new(DynamicType::Array(ArrayDynamic {
            static_type: array_static,
            num_elements: 8,
            bit_offset: 8, // packed values start at byte 1
            element_bit_size: 8,
            elements: None,
            packing: Some(SimplePacking {
                reference: 0.0,
                binary_scale: 0,
                decimal_scale: 0,
                element_bit_size: 8,
                bitmask_bit_offset: Some(0),
            }),
            attributes: None,
        }));
        cursor.set_product(array_dynamic);
        cursor.goto_array_element_by_index(0).unwrap();
        assert_eq!(cursor.read_double().unwrap(), 7.0);
        cursor.goto_parent().unwrap();
        cursor.goto_array_element_by_index(1).unwrap();
        assert!(cursor.read_double().unwrap().is_nan());
        cursor.goto_parent().unwrap();
        cursor.goto_array_element_by_index(2).unwrap();
        assert_eq!(cursor.read_double().unwrap(), 9.0);
    }
}
