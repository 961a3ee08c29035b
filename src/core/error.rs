// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error type for coda.
//!
//! A single value-typed error enum covers every fallible operation in the
//! library: navigation, reads, codadef parsing, and backend recognition.
//! Construction errors (codadef parsing) carry file/line context; product
//! errors distinguish a malformed file (`Product`) from a well-formed file
//! this implementation cannot handle (`UnsupportedProduct`), since callers
//! such as `codafind` treat the two differently.

use std::fmt;

/// Errors that can occur during coda operations.
#[derive(Debug, Clone)]
pub enum CodaError {
    /// Memory allocation failed (kept for parity with the C API's error
    /// kinds; in practice only raised when a caller-supplied size is
    /// clearly bogus).
    OutOfMemory,

    /// Could not open a file.
    FileOpen {
        /// Path that failed to open.
        path: String,
        /// Underlying OS error message.
        message: String,
    },

    /// A read from the backing file failed or ran out of bounds.
    FileRead {
        /// Path being read.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// A caller-supplied argument was invalid.
    InvalidArgument {
        /// Description of the bad argument.
        message: String,
    },

    /// A record field or path step referenced a name that does not exist.
    InvalidName {
        /// The name that was not found.
        name: String,
    },

    /// A path string or other structured input was malformed.
    InvalidFormat {
        /// Description of the malformed input.
        message: String,
    },

    /// An operation was attempted against a type of the wrong class.
    InvalidType {
        /// Expected type class.
        expected: String,
        /// Actual type class encountered.
        actual: String,
    },

    /// `get_array_dim` was called with a `num_dims` mismatch.
    ArrayNumDimsMismatch {
        /// Number of dimensions the array actually has.
        expected: i32,
        /// Number of dimensions requested by the caller.
        actual: i32,
    },

    /// An array index was outside `[0, num_elements)`.
    ArrayOutOfBounds {
        /// Requested index.
        index: i64,
        /// Number of elements in the array.
        num_elements: i64,
    },

    /// A byte or bit read exceeded the bounds of the underlying file.
    OutOfBoundsRead {
        /// Byte or bit offset requested.
        offset: i64,
        /// Length requested.
        length: i64,
        /// Size of the underlying source.
        source_size: i64,
    },

    /// The product file is malformed (bad signature, impossible size, etc).
    Product {
        /// Description of the malformation.
        message: String,
    },

    /// The product file may be valid, but this implementation does not
    /// support the variant it uses (e.g. VAX floating point, EPOCH16).
    UnsupportedProduct {
        /// Description of the unsupported feature.
        message: String,
    },

    /// A codadef (or the definitions it contains) is malformed.
    DataDefinition {
        /// Source file the definition came from, if known.
        file: Option<String>,
        /// Line number within the XML document, if known.
        line: Option<u64>,
        /// Description of the problem.
        message: String,
    },

    /// An expression string failed to parse.
    ExpressionSyntax {
        /// The expression text.
        expression: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// An expression failed during evaluation (type mismatch, division by
    /// zero, missing cursor context, out-of-range conversion).
    ExpressionEvaluation {
        /// Description of the evaluation failure.
        message: String,
    },

    /// The codadef XML could not be parsed.
    Xml {
        /// Description of the XML problem.
        message: String,
    },

    /// No product definition in the dictionary matched the file.
    NoSuchProduct {
        /// Path of the file that failed detection.
        path: String,
    },

    /// Catch-all for conditions that do not fit another variant.
    Other(String),
}

impl CodaError {
    /// Build a `DataDefinition` error with file/line context.
    pub fn data_definition(
        file: impl Into<String>,
        line: u64,
        message: impl Into<String>,
    ) -> Self {
        CodaError::DataDefinition {
            file: Some(file.into()),
            line: Some(line),
            message: message.into(),
        }
    }

    /// Build a `DataDefinition` error without file/line context.
    pub fn data_definition_msg(message: impl Into<String>) -> Self {
        CodaError::DataDefinition {
            file: None,
            line: None,
            message: message.into(),
        }
    }

    /// Build an `UnsupportedProduct` error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        CodaError::UnsupportedProduct {
            message: message.into(),
        }
    }

    /// Build a `Product` (malformed file) error.
    pub fn product(message: impl Into<String>) -> Self {
        CodaError::Product {
            message: message.into(),
        }
    }

    /// Build an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CodaError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Build an `InvalidFormat` error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        CodaError::InvalidFormat {
            message: message.into(),
        }
    }

    /// Build an `ExpressionSyntax` error.
    pub fn expression_syntax(expression: impl Into<String>, message: impl Into<String>) -> Self {
        CodaError::ExpressionSyntax {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Build an `ExpressionEvaluation` error.
    pub fn expression_eval(message: impl Into<String>) -> Self {
        CodaError::ExpressionEvaluation {
            message: message.into(),
        }
    }

    /// True if this is an `UnsupportedProduct` error — the file may well be
    /// valid, this implementation just can't read it. `codafind` treats this
    /// as "not a match" rather than an error.
    pub fn is_unsupported_product(&self) -> bool {
        matches!(self, CodaError::UnsupportedProduct { .. })
    }

    /// Get structured fields for logging via `tracing`.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodaError::OutOfMemory => vec![],
            CodaError::FileOpen { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            CodaError::FileRead { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            CodaError::InvalidArgument { message } => vec![("message", message.clone())],
            CodaError::InvalidName { name } => vec![("name", name.clone())],
            CodaError::InvalidFormat { message } => vec![("message", message.clone())],
            CodaError::InvalidType { expected, actual } => {
                vec![("expected", expected.clone()), ("actual", actual.clone())]
            }
            CodaError::ArrayNumDimsMismatch { expected, actual } => vec![
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
            CodaError::ArrayOutOfBounds { index, num_elements } => vec![
                ("index", index.to_string()),
                ("num_elements", num_elements.to_string()),
            ],
            CodaError::OutOfBoundsRead {
                offset,
                length,
                source_size,
            } => vec![
                ("offset", offset.to_string()),
                ("length", length.to_string()),
                ("source_size", source_size.to_string()),
            ],
            CodaError::Product { message } => vec![("message", message.clone())],
            CodaError::UnsupportedProduct { message } => vec![("message", message.clone())],
            CodaError::DataDefinition { file, line, message } => {
                let mut fields = vec![("message", message.clone())];
                if let Some(file) = file {
                    fields.push(("file", file.clone()));
                }
                if let Some(line) = line {
                    fields.push(("line", line.to_string()));
                }
                fields
            }
            CodaError::ExpressionSyntax { expression, message } => vec![
                ("expression", expression.clone()),
                ("message", message.clone()),
            ],
            CodaError::ExpressionEvaluation { message } => vec![("message", message.clone())],
            CodaError::Xml { message } => vec![("message", message.clone())],
            CodaError::NoSuchProduct { path } => vec![("path", path.clone())],
            CodaError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl fmt::Display for CodaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodaError::OutOfMemory => write!(f, "out of memory"),
            CodaError::FileOpen { path, message } => {
                write!(f, "could not open '{path}': {message}")
            }
            CodaError::FileRead { path, message } => {
                write!(f, "read error on '{path}': {message}")
            }
            CodaError::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
            CodaError::InvalidName { name } => write!(f, "invalid name: '{name}'"),
            CodaError::InvalidFormat { message } => write!(f, "invalid format: {message}"),
            CodaError::InvalidType { expected, actual } => {
                write!(f, "expected type class '{expected}', got '{actual}'")
            }
            CodaError::ArrayNumDimsMismatch { expected, actual } => write!(
                f,
                "array has {expected} dimensions, but {actual} were requested"
            ),
            CodaError::ArrayOutOfBounds { index, num_elements } => write!(
                f,
                "array index {index} is out of bounds [0, {num_elements})"
            ),
            CodaError::OutOfBoundsRead {
                offset,
                length,
                source_size,
            } => write!(
                f,
                "read of {length} bytes/bits at {offset} exceeds source size {source_size}"
            ),
            CodaError::Product { message } => write!(f, "product error: {message}"),
            CodaError::UnsupportedProduct { message } => {
                write!(f, "unsupported product: {message}")
            }
            CodaError::DataDefinition { file, line, message } => {
                write!(f, "data definition error: {message}")?;
                if let Some(file) = file {
                    write!(f, " (in {file}")?;
                    if let Some(line) = line {
                        write!(f, ":{line}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            CodaError::ExpressionSyntax { expression, message } => {
                write!(f, "expression syntax error in '{expression}': {message}")
            }
            CodaError::ExpressionEvaluation { message } => {
                write!(f, "expression evaluation error: {message}")
            }
            CodaError::Xml { message } => write!(f, "xml error: {message}"),
            CodaError::NoSuchProduct { path } => {
                write!(f, "no product definition matches '{path}'")
            }
            CodaError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CodaError {}

impl From<std::io::Error> for CodaError {
    fn from(err: std::io::Error) -> Self {
        CodaError::FileRead {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for CodaError {
    fn from(err: quick_xml::Error) -> Self {
        CodaError::Xml {
            message: err.to_string(),
        }
    }
}

/// Result type for coda operations.
pub type Result<T> = std::result::Result<T, CodaError>;
