// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte/bit reading and endian conversion (§4.1-4.2, C1/C2).
//!
//! Every backend reads through a [`ByteSource`] and [`read_bits`]/
//! [`read_bytes`]; nothing downstream opens a file directly.

pub mod endian;
pub mod reader;
pub mod source;

pub use endian::{to_host, EndianSwap};
pub use reader::{read_bits, read_bytes};
pub use source::{ByteSource, FileSource, MemorySource};
