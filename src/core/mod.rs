// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout coda.
//!
//! This module provides the foundational types for the library:
//! - [`CodaError`] - the error type for all fallible operations
//! - [`Options`] - thread-local navigation/conversion/I/O options
//! - [`Format`] - the product format tag
//! - [`TypeRegistry`] - the generic name registry backing the codadef dictionary

pub mod error;
pub mod format;
pub mod options;
pub mod registry;

pub use error::{CodaError, Result};
pub use format::{ArrayOrdering, Format, TypeClass};
pub use options::{Options, OptionsGuard};
pub use registry::TypeRegistry;
