// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Tree-node path matcher (§3 "attribute tree-matching helper", §4.11 C11).
//!
//! Binds external items (used by `codacmp`'s field-exclude lists and
//! `codafind`'s detection filters) to paths in a product's static-type
//! tree, then looks items up by a live cursor's position. A node's
//! indexed children are keyed by record field index or array index
//! (attributes use index `-1`, mirroring the source this is grounded on);
//! a separate `all_children` node holds items attached to every element of
//! an array (`/foo[]/bar`) and is only consulted when no exact-index child
//! matches, giving specific indices precedence over the wildcard.

use std::sync::Arc;

use crate::core::{CodaError, Result, TypeClass};
use crate::cursor::Cursor;
use crate::types::{StaticType, TypeRef};

/// One node in the path tree: the static type it corresponds to, the items
/// attached directly at this node, and its children.
pub struct TreeNode<T> {
    node_type: TypeRef,
    items: Vec<T>,
    all_children: Option<Box<TreeNode<T>>>,
    indexed_children: Vec<(i64, TreeNode<T>)>,
}

fn base_type_for_indexing(ty: &TypeRef) -> TypeRef {
    match ty.as_ref() {
        StaticType::Special(special) => special.base_type().clone(),
        _ => ty.clone(),
    }
}

impl<T> TreeNode<T> {
    /// Create an empty tree rooted at `root_type`, the product's (or
    /// product type's) root static type.
    pub fn new(root_type: TypeRef) -> Self {
        TreeNode { node_type: root_type, items: Vec::new(), all_children: None, indexed_children: Vec::new() }
    }

    fn child_type_for_index(&self, index: i64) -> Result<TypeRef> {
        if index == -1 {
            return match self.node_type.as_ref() {
                StaticType::Record(record) => record
                    .attributes
                    .clone()
                    .ok_or_else(|| CodaError::invalid_argument("type has no attributes")),
                StaticType::Array(array) => array
                    .attributes
                    .clone()
                    .ok_or_else(|| CodaError::invalid_argument("type has no attributes")),
                _ => Err(CodaError::invalid_argument("type has no attributes")),
            };
        }
        match base_type_for_indexing(&self.node_type).as_ref() {
            StaticType::Array(array) => Ok(array.base_type.clone()),
            StaticType::Record(record) => record
                .field(index as usize)
                .map(|field| field.field_type.clone())
                .ok_or_else(|| CodaError::InvalidName { name: format!("field index {index}") }),
            other => Err(CodaError::InvalidType { expected: "array or record".into(), actual: format!("{other:?}") }),
        }
    }

    fn child_for_all(&mut self) -> Result<&mut TreeNode<T>> {
        if self.all_children.is_none() {
            let element_type = match base_type_for_indexing(&self.node_type).as_ref() {
                StaticType::Array(array) => array.base_type.clone(),
                other => {
                    return Err(CodaError::InvalidType { expected: "array".into(), actual: format!("{other:?}") })
                }
            };
            self.all_children = Some(Box::new(TreeNode::new(element_type)));
        }
        Ok(self.all_children.as_mut().unwrap())
    }

    fn child_for_index(&mut self, index: i64) -> Result<&mut TreeNode<T>> {
        if let Ok(pos) = self.indexed_children.binary_search_by_key(&index, |(i, _)| *i) {
            return Ok(&mut self.indexed_children[pos].1);
        }
        let child_type = self.child_type_for_index(index)?;
        let pos = self.indexed_children.partition_point(|(i, _)| *i < index);
        self.indexed_children.insert(pos, (index, TreeNode::new(child_type)));
        Ok(&mut self.indexed_children[pos].1)
    }

    /// Attach `item` at the tree position named by `path` (the same syntax
    /// `Cursor::goto` accepts: `/field`, `[i]`, `[]` for "every element",
    /// `@attr`). If `leaf_only` is set, the path must land on a scalar
    /// (not an array or record) node.
    pub fn add_item_for_path(&mut self, path: &str, item: T, leaf_only: bool) -> Result<()> {
        let mut node = self;
        let bytes = path.as_bytes();
        let mut pos = 0usize;
        if bytes.first() == Some(&b'/') {
            let next = bytes.get(1);
            if next.is_none() || matches!(next, Some(b'/') | Some(b'[') | Some(b'@')) {
                pos = 1;
            }
        }

        while pos < bytes.len() {
            match bytes[pos] {
                b'@' => {
                    node = node.child_for_index(-1)?;
                    pos += 1;
                }
                b'[' => {
                    let start = pos + 1;
                    let end = path[start..]
                        .find(']')
                        .map(|i| start + i)
                        .ok_or_else(|| CodaError::invalid_format(format!("path '{path}' is missing ']'")))?;
                    if start == end {
                        node = node.child_for_all()?;
                    } else {
                        let index: i64 = path[start..end]
                            .parse()
                            .map_err(|_| CodaError::invalid_format(format!("invalid array index in '{path}'")))?;
                        node = node.child_for_index(index)?;
                    }
                    pos = end + 1;
                }
                b'/' => {
                    let start = pos + 1;
                    let end = path[start..]
                        .find(['/', '[', '@'])
                        .map(|i| start + i)
                        .unwrap_or(path.len());
                    let field_name = &path[start..end];
                    let index = match base_type_for_indexing(&node.node_type).as_ref() {
                        StaticType::Record(record) => record
                            .field_index_by_name(field_name)
                            .ok_or_else(|| CodaError::InvalidName { name: field_name.to_string() })?,
                        other => {
                            return Err(CodaError::InvalidType {
                                expected: "record".into(),
                                actual: format!("{other:?}"),
                            })
                        }
                    };
                    node = node.child_for_index(index as i64)?;
                    pos = end;
                }
                _ => return Err(CodaError::invalid_format(format!("path '{path}' is missing a leading '/'"))),
            }
        }

        if leaf_only && matches!(node.node_type.type_class(), TypeClass::Array | TypeClass::Record) {
            return Err(CodaError::invalid_argument(format!("path '{path}' does not point to a leaf item")));
        }
        node.items.push(item);
        Ok(())
    }

    /// Find the item bound to `cursor`'s current position: specific
    /// indices beat the `[]` wildcard at each level, and among several
    /// items registered at the same node the most recently added wins.
    pub fn get_item_for_cursor(&self, cursor: &Cursor) -> Option<&T> {
        get_item(self, cursor, 0)
    }
}

fn get_item<'a, T>(node: &'a TreeNode<T>, cursor: &Cursor, depth: usize) -> Option<&'a T> {
    if depth < cursor.get_depth() {
        let index = cursor.frame_index_at(depth + 1) as i64;
        if let Ok(pos) = node.indexed_children.binary_search_by_key(&index, |(i, _)| *i) {
            if let Some(item) = get_item(&node.indexed_children[pos].1, cursor, depth + 1) {
                return Some(item);
            }
        }
        if let Some(all) = &node.all_children {
            if let Some(item) = get_item(all, cursor, depth + 1) {
                return Some(item);
            }
        }
        None
    } else {
        node.items.last()
    }
}
