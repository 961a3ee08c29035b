// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of the expression language evaluated both as pure
//! constants and against a live cursor position.

use std::sync::Arc;

use coda::bitio::{ByteSource, MemorySource};
use coda::core::Format;
use coda::dynamic::{ArrayDynamic, DynamicType, FilePosition};
use coda::expr::{self, EvalContext, Value};
use coda::types::array::{ArrayType, Dimension};
use coda::types::number::{NumberClass, NumberType, ReadType};
use coda::types::record::{Field, RecordType};
use coda::types::{StaticType, TypeRef};
use coda::Cursor;

fn int_type() -> TypeRef {
    Arc::new(StaticType::Number(NumberType::new(NumberClass::Integer, ReadType::I32, 32)))
}

fn build_cursor() -> Cursor {
    let mut data = vec![0u8; 16];
    data[0..4].copy_from_slice(&7i32.to_be_bytes());
    data[4..8].copy_from_slice(&10i32.to_be_bytes());
    data[8..12].copy_from_slice(&20i32.to_be_bytes());
    data[12..16].copy_from_slice(&30i32.to_be_bytes());
    let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(data));

    let scalar_a = DynamicType::scalar(int_type(), FilePosition::at(0, 32));
    let array_elements: Vec<_> =
        (0..3).map(|i| DynamicType::scalar(int_type(), FilePosition::at(32 + i * 32, 32))).collect();
    let array_type: TypeRef = Arc::new(StaticType::Array(ArrayType::new(int_type(), vec![Dimension::Constant(3)])));
    let array_b = Arc::new(DynamicType::Array(ArrayDynamic {
        static_type: array_type,
        num_elements: 3,
        bit_offset: 32,
        element_bit_size: 32,
        elements: Some(array_elements),
        packing: None,
        attributes: None,
    }));

    let mut record_type = RecordType::new();
    record_type.add_field(Field::new("a", int_type())).unwrap();
    record_type.add_field(Field::new("b", array_b.static_type().clone())).unwrap();
    let root_static: TypeRef = Arc::new(StaticType::Record(record_type));

    let root = Arc::new(DynamicType::Record(coda::dynamic::RecordDynamic {
        static_type: root_static,
        fields: vec![Some(scalar_a), Some(array_b)],
        attributes: None,
    }));

    let mut cursor = Cursor::new(source, "t.bin", Format::Binary);
    cursor.set_product(root);
    cursor
}

#[test]
fn folds_pure_arithmetic_without_a_context() {
    let expr = expr::parse("(2 + 3) * 4").unwrap();
    assert_eq!(expr::eval(&expr, None).unwrap(), Value::Int(20));
}

#[test]
fn path_requires_a_context() {
    let expr = expr::parse("./a").unwrap();
    assert!(expr::eval(&expr, None).is_err());
}

#[test]
fn reads_scalar_field_through_path_expression() {
    let cursor = build_cursor();
    let expr = expr::parse("./a").unwrap();
    assert_eq!(expr::eval(&expr, Some(&cursor as &dyn EvalContext)).unwrap(), Value::Int(7));
}

#[test]
fn reads_array_element_through_path_expression() {
    let cursor = build_cursor();
    let expr = expr::parse("./b[1] + 1").unwrap();
    assert_eq!(expr::eval(&expr, Some(&cursor as &dyn EvalContext)).unwrap(), Value::Int(21));
}

#[test]
fn comparison_against_field_value() {
    let cursor = build_cursor();
    let expr = expr::parse("./a == 7").unwrap();
    assert_eq!(expr::eval(&expr, Some(&cursor as &dyn EvalContext)).unwrap(), Value::Bool(true));
}

#[test]
fn filename_builtin_reports_cursor_filename() {
    let cursor = build_cursor();
    let expr = expr::parse("filename()").unwrap();
    match expr::eval(&expr, Some(&cursor as &dyn EvalContext)).unwrap() {
        Value::String(name) => assert_eq!(&*name, b"t.bin"),
        other => panic!("expected a string, got {other:?}"),
    }
}
