// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Expression AST (§4.5 C5).
//!
//! Every node is a value-typed enum variant rather than a trait object tree;
//! this keeps expressions `Clone`able and lets `types::*` embed an `Expr`
//! directly in a bit-offset or dimension slot without a lifetime.

use std::sync::Arc;

/// An expression tree. Cheap to clone: all recursive fields are boxed.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    BoolLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(Arc<[u8]>),

    /// Reference to a product variable, `field()`, or an unqualified name
    /// that resolves against the current cursor position.
    Identifier(String),

    UnaryMinus(Box<Expr>),
    Not(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Mod(Box<Expr>, Box<Expr>),

    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),

    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),

    /// `regex(pattern, text)`.
    Regex(Box<Expr>, Box<Expr>),
    /// `substr(start, len, s)`.
    Substr(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `bytes(cursor_expr, len)`.
    Bytes(Box<Expr>, Box<Expr>),
    /// `str(.)`.
    Str(Box<Expr>),
    /// `float(.)`.
    Float(Box<Expr>),
    /// `int(.)`.
    Int(Box<Expr>),
    /// `time(s, format)`.
    Time(Box<Expr>, Box<Expr>),
    /// `file_size()`.
    FileSize,
    /// `filename()`.
    Filename,

    /// A path navigation, e.g. `./a/b[2]@unit` or `../c`.
    Path(Path),

    /// `expr[index]` applied to a path-producing expression.
    Index(Box<Expr>, Box<Expr>),
}

/// A navigation path, relative (`.` prefix) or rooted at the product root.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub absolute: bool,
    pub steps: Vec<PathStep>,
}

/// One step of a navigation path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    Field(String),
    Index(Box<Expr>),
    Attribute(String),
    Parent,
}

/// The tagged result of evaluating an [`Expr`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<[u8]>),
    Void,
}

impl Value {
    /// Name of this value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Void => "void",
        }
    }

    /// Coerce to `bool`, the only implicit conversion the language allows.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce to `i64`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Coerce to `f64`, widening an int if necessary.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Coerce to a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}
