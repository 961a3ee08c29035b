// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # coda
//!
//! Uniform, read-only, hierarchical access to scientific/earth-observation
//! data products stored in heterogeneous binary formats (CDF, GRIB). A
//! caller opens a [`Product`] and navigates its logical tree with a
//! [`Cursor`]; at each node the cursor reports type information and typed
//! data (scalars, arrays, strings, raw bit-blobs). The format machinery is
//! transparent: once a product is open, the access API does not depend on
//! the underlying container.
//!
//! ## Example: opening a product and reading a field
//!
//! ```rust,no_run
//! # fn main() -> coda::Result<()> {
//! use coda::Product;
//!
//! let product = Product::open("sample.grib")?;
//! let mut cursor = product.cursor();
//! cursor.goto("/0/grib1/values[0]")?;
//! let value = cursor.read_double()?;
//! println!("first value: {value}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: loading a data dictionary and recognizing a file
//!
//! ```rust,no_run
//! # fn main() -> coda::Result<()> {
//! use coda::{codadef, Product};
//!
//! codadef::load_definition_path("/usr/share/coda/definitions")?;
//! let recognized = Product::recognize_file("sample.cdf")?;
//! println!("format: {}", recognized.format);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bitio;
pub mod codadef;
pub mod core;
pub mod cursor;
pub mod dynamic;
pub mod expr;
pub mod matcher;
pub mod product;
pub mod types;
pub mod zip;

pub use core::{CodaError, Format, Options, OptionsGuard, Result};
pub use cursor::Cursor;
pub use matcher::TreeNode;
pub use product::{Product, RecognizedProduct};
