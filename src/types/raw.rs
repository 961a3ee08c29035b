// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw static type: an opaque byte region (§3 Static Type, §4.4 C4).

use crate::types::{BitSize, TypeRef};

#[derive(Debug, Clone)]
pub struct RawType {
    pub bit_size: BitSize,
    pub fixed_value: Option<Vec<u8>>,
    pub attributes: Option<TypeRef>,
}

impl RawType {
    pub fn new(bit_size: BitSize) -> Self {
        RawType {
            bit_size,
            fixed_value: None,
            attributes: None,
        }
    }

    pub fn with_fixed_value(mut self, value: Vec<u8>) -> Self {
        self.fixed_value = Some(value);
        self
    }

    pub fn with_attributes(mut self, attributes: TypeRef) -> Self {
        self.attributes = Some(attributes);
        self
    }
}
