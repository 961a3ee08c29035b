// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end coverage of `TreeNode` path binding against a record-of-array
//! static type, the shape `codacmp`'s field-exclude lists and `codafind`'s
//! detection filters both bind items to.

use std::sync::Arc;

use coda::core::Format;
use coda::dynamic::{ArrayDynamic, DynamicType, FilePosition};
use coda::types::array::{ArrayType, Dimension};
use coda::types::number::{NumberClass, NumberType, ReadType};
use coda::types::record::{Field, RecordType};
use coda::types::{StaticType, TypeRef};
use coda::{Cursor, TreeNode};

fn int_type() -> TypeRef {
    Arc::new(StaticType::Number(NumberType::new(NumberClass::Integer, ReadType::I32, 32)))
}

fn root_type() -> TypeRef {
    let array_type: TypeRef = Arc::new(StaticType::Array(ArrayType::new(int_type(), vec![Dimension::Constant(3)])));
    let mut record_type = RecordType::new();
    record_type.add_field(Field::new("values", array_type)).unwrap();
    Arc::new(StaticType::Record(record_type))
}

fn cursor_at_values_index(index: u64) -> Cursor {
    let elements: Vec<_> =
        (0..3).map(|i| DynamicType::scalar(int_type(), FilePosition::at(i * 32, 32))).collect();
    let array_type: TypeRef = Arc::new(StaticType::Array(ArrayType::new(int_type(), vec![Dimension::Constant(3)])));
    let array = Arc::new(DynamicType::Array(ArrayDynamic {
        static_type: array_type,
        num_elements: 3,
        bit_offset: 0,
        element_bit_size: 32,
        elements: Some(elements),
        packing: None,
        attributes: None,
    }));
    let mut record_type = RecordType::new();
    record_type.add_field(Field::new("values", array.static_type().clone())).unwrap();
    let root = Arc::new(DynamicType::Record(coda::dynamic::RecordDynamic {
        static_type: Arc::new(StaticType::Record(record_type)),
        fields: vec![Some(array)],
        attributes: None,
    }));

    let source: Arc<dyn coda::bitio::ByteSource> = Arc::new(coda::bitio::MemorySource::new(vec![0u8; 16]));
    let mut cursor = Cursor::new(source, "t.bin", Format::Binary);
    cursor.set_product(root);
    cursor.goto_record_field_by_name("values").unwrap();
    cursor.goto_array_element_by_index(index).unwrap();
    cursor
}

#[test]
fn binds_and_looks_up_a_nested_array_element() {
    let mut tree: TreeNode<&'static str> = TreeNode::new(root_type());
    tree.add_item_for_path("/values[1]", "excluded", true).unwrap();

    assert_eq!(tree.get_item_for_cursor(&cursor_at_values_index(1)), Some(&"excluded"));
    assert_eq!(tree.get_item_for_cursor(&cursor_at_values_index(0)), None);
}

#[test]
fn wildcard_applies_to_every_element_but_yields_to_an_exact_index() {
    let mut tree: TreeNode<&'static str> = TreeNode::new(root_type());
    tree.add_item_for_path("/values[]", "all", true).unwrap();
    tree.add_item_for_path("/values[2]", "just-two", true).unwrap();

    assert_eq!(tree.get_item_for_cursor(&cursor_at_values_index(0)), Some(&"all"));
    assert_eq!(tree.get_item_for_cursor(&cursor_at_values_index(2)), Some(&"just-two"));
}

#[test]
fn leaf_only_rejects_a_record_or_array_path() {
    let mut tree: TreeNode<&'static str> = TreeNode::new(root_type());
    assert!(tree.add_item_for_path("/values", "whole-array", true).is_err());
    assert!(tree.add_item_for_path("/values", "whole-array", false).is_ok());
}

#[test]
fn unknown_field_name_is_rejected() {
    let mut tree: TreeNode<&'static str> = TreeNode::new(root_type());
    assert!(tree.add_item_for_path("/missing", "x", true).is_err());
}
