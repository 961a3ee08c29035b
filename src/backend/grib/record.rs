// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! A small builder for the backend-synthesized records GRIB messages are
//! made of (§4.10 C10). Every field value here was already fully read at
//! open time - there is nothing left to defer to a cursor - so each one
//! is wrapped as an [`DynamicType::in_memory_scalar`] rather than given a
//! file position.

use std::sync::Arc;

use crate::core::Result;
use crate::dynamic::{DynamicRef, DynamicType, RecordDynamic};
use crate::expr::Value;
use crate::types::number::{NumberClass, NumberType, ReadType};
use crate::types::record::{Field, RecordType};
use crate::types::{StaticType, TypeRef};

pub struct RecordBuilder {
    ty: RecordType,
    values: Vec<Option<DynamicRef>>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        RecordBuilder { ty: RecordType::new(), values: Vec::new() }
    }

    fn add(&mut self, name: &str, field_type: TypeRef, value: DynamicRef) {
        self.ty.add_field(Field::new(name, field_type)).expect("GRIB record field names are unique by construction");
        self.values.push(Some(value));
    }

    pub fn u8(&mut self, name: &str, value: u8) -> &mut Self {
        self.int(name, NumberClass::Integer, ReadType::U8, 8, value as i64)
    }

    pub fn u16(&mut self, name: &str, value: u16) -> &mut Self {
        self.int(name, NumberClass::Integer, ReadType::U16, 16, value as i64)
    }

    pub fn u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.int(name, NumberClass::Integer, ReadType::U32, 32, value as i64)
    }

    pub fn i16(&mut self, name: &str, value: i32) -> &mut Self {
        self.int(name, NumberClass::Integer, ReadType::I16, 16, value as i64)
    }

    pub fn i32(&mut self, name: &str, value: i64) -> &mut Self {
        self.int(name, NumberClass::Integer, ReadType::I32, 32, value)
    }

    fn int(&mut self, name: &str, class: NumberClass, read_type: ReadType, bit_size: u64, value: i64) -> &mut Self {
        let field_type: TypeRef = Arc::new(StaticType::Number(NumberType::new(class, read_type, bit_size)));
        let dyn_value = DynamicType::in_memory_scalar(field_type.clone(), Value::Int(value));
        self.add(name, field_type, dyn_value);
        self
    }

    pub fn f32(&mut self, name: &str, value: f32) -> &mut Self {
        self.float(name, ReadType::F32, 32, value as f64)
    }

    pub fn f64(&mut self, name: &str, value: f64) -> &mut Self {
        self.float(name, ReadType::F64, 64, value)
    }

    fn float(&mut self, name: &str, read_type: ReadType, bit_size: u64, value: f64) -> &mut Self {
        let field_type: TypeRef =
            Arc::new(StaticType::Number(NumberType::new(NumberClass::Real, read_type, bit_size)));
        let dyn_value = DynamicType::in_memory_scalar(field_type.clone(), Value::Float(value));
        self.add(name, field_type, dyn_value);
        self
    }

    pub fn field(&mut self, name: &str, field_type: TypeRef, value: DynamicRef) -> &mut Self {
        self.add(name, field_type, value);
        self
    }

    pub fn finish(self) -> Result<(TypeRef, DynamicRef)> {
        self.ty.validate(false)?;
        let static_type: TypeRef = Arc::new(StaticType::Record(self.ty));
        let dynamic = Arc::new(DynamicType::Record(RecordDynamic {
            static_type: static_type.clone(),
            fields: self.values,
            attributes: None,
        }));
        Ok((static_type, dynamic))
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}
