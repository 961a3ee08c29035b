// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Path-string parsing for `Cursor::goto` (§4.8 C8).
//!
//! `goto` accepts the same path grammar the expression language uses for
//! navigation (`./a/b[2]@unit`, `../c`, `/d`), so rather than duplicate the
//! grammar this just asks the expression parser for a bare `Path` and
//! rejects anything else (arithmetic, function calls).

use crate::core::{CodaError, Result};
use crate::expr::{self, Expr, Path};

/// Parse a `goto`-style path string.
pub fn parse_goto_path(text: &str) -> Result<Path> {
    match expr::parse(text)? {
        Expr::Path(path) => Ok(path),
        other => Err(CodaError::invalid_format(format!(
            "'{text}' is not a navigation path (parsed as {other:?})"
        ))),
    }
}
