// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Expression evaluation (§4.5 C5).
//!
//! Evaluation needs to read values and navigate a product tree, but `expr`
//! sits below `cursor` in the dependency graph (cursor evaluates
//! bit-offset/size/availability expressions while navigating). [`EvalContext`]
//! breaks the cycle: `cursor::Cursor` implements it, `eval` only depends on
//! the trait.

use std::sync::Arc;

use crate::core::{CodaError, Result};
use crate::expr::ast::{Expr, Path, PathStep, Value};

/// A path step with any index sub-expression already reduced to a concrete
/// integer, ready for a context to act on without re-entering the evaluator.
#[derive(Debug, Clone)]
pub enum ResolvedStep {
    Field(String),
    Index(i64),
    Attribute(String),
    Parent,
}

/// The environment an expression evaluates against: a position within a
/// product (or no position, for constant-only evaluation), plus the handful
/// of whole-product facts the built-in functions expose.
pub trait EvalContext {
    /// Total size of the product's backing file, in bytes.
    fn file_size(&self) -> Result<i64>;

    /// The product's file name (no directory component).
    fn filename(&self) -> Result<String>;

    /// Resolve a bare identifier: a product variable or a named constant
    /// bound by the surrounding definition.
    fn resolve_identifier(&self, name: &str) -> Result<Value>;

    /// Navigate from this position by `steps`, returning a new context at
    /// the destination. Errors with `InvalidName`/`ArrayOutOfBounds` as
    /// appropriate.
    fn navigate(&self, steps: &[ResolvedStep]) -> Result<Box<dyn EvalContext + '_>>;

    /// Read the value at the current position via the standard typed read
    /// path (§4.8), producing the value in its most natural `Value` form.
    fn read_value(&self) -> Result<Value>;

    /// Read `len` raw bytes starting at the current position.
    fn read_bytes(&self, len: i64) -> Result<Vec<u8>>;
}

/// Evaluate `expr` against `ctx`. Pass `None` to evaluate a constant
/// sub-expression with no cursor context (fails if `expr` actually needs one).
pub fn eval(expr: &Expr, ctx: Option<&dyn EvalContext>) -> Result<Value> {
    match expr {
        Expr::BoolLiteral(b) => Ok(Value::Bool(*b)),
        Expr::IntLiteral(i) => Ok(Value::Int(*i)),
        Expr::FloatLiteral(f) => Ok(Value::Float(*f)),
        Expr::StringLiteral(s) => Ok(Value::String(s.clone())),

        Expr::Identifier(name) => require_ctx(ctx)?.resolve_identifier(name),

        Expr::UnaryMinus(e) => match eval(e, ctx)? {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            v => Err(type_error("int or float", &v)),
        },
        Expr::Not(e) => match eval(e, ctx)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            v => Err(type_error("bool", &v)),
        },

        Expr::Add(a, b) => numeric_binop(eval(a, ctx)?, eval(b, ctx)?, |x, y| x + y, |x, y| Ok(x + y)),
        Expr::Sub(a, b) => numeric_binop(eval(a, ctx)?, eval(b, ctx)?, |x, y| x - y, |x, y| Ok(x - y)),
        Expr::Mul(a, b) => numeric_binop(eval(a, ctx)?, eval(b, ctx)?, |x, y| x * y, |x, y| Ok(x * y)),
        Expr::Div(a, b) => numeric_binop(
            eval(a, ctx)?,
            eval(b, ctx)?,
            |x, y| x / y,
            |x, y| {
                if y == 0 {
                    Err(CodaError::expression_eval("division by zero"))
                } else {
                    Ok(x / y)
                }
            },
        ),
        Expr::Mod(a, b) => numeric_binop(
            eval(a, ctx)?,
            eval(b, ctx)?,
            |x, y| x % y,
            |x, y| {
                if y == 0 {
                    Err(CodaError::expression_eval("division by zero"))
                } else {
                    Ok(x % y)
                }
            },
        ),

        Expr::And(a, b) => Ok(Value::Bool(as_bool(&eval(a, ctx)?)? && as_bool(&eval(b, ctx)?)?)),
        Expr::Or(a, b) => Ok(Value::Bool(as_bool(&eval(a, ctx)?)? || as_bool(&eval(b, ctx)?)?)),

        Expr::Eq(a, b) => Ok(Value::Bool(values_equal(&eval(a, ctx)?, &eval(b, ctx)?)?)),
        Expr::Ne(a, b) => Ok(Value::Bool(!values_equal(&eval(a, ctx)?, &eval(b, ctx)?)?)),
        Expr::Lt(a, b) => compare(eval(a, ctx)?, eval(b, ctx)?, |o| o == std::cmp::Ordering::Less),
        Expr::Le(a, b) => compare(eval(a, ctx)?, eval(b, ctx)?, |o| o != std::cmp::Ordering::Greater),
        Expr::Gt(a, b) => compare(eval(a, ctx)?, eval(b, ctx)?, |o| o == std::cmp::Ordering::Greater),
        Expr::Ge(a, b) => compare(eval(a, ctx)?, eval(b, ctx)?, |o| o != std::cmp::Ordering::Less),

        Expr::Regex(pattern, text) => {
            let pattern = as_string(&eval(pattern, ctx)?)?;
            let text = as_string(&eval(text, ctx)?)?;
            let re = regex::Regex::new(&pattern)
                .map_err(|e| CodaError::expression_eval(format!("invalid regex: {e}")))?;
            Ok(Value::Bool(re.is_match(&text)))
        }
        Expr::Substr(start, len, s) => {
            let start = as_int(&eval(start, ctx)?)?;
            let len = as_int(&eval(len, ctx)?)?;
            let s = as_string(&eval(s, ctx)?)?;
            let bytes = s.as_bytes();
            let start = start.max(0) as usize;
            let end = (start as i64 + len.max(0)).min(bytes.len() as i64) as usize;
            let start = start.min(bytes.len());
            let slice = &bytes[start..end.max(start)];
            Ok(Value::String(Arc::from(slice.to_vec().into_boxed_slice())))
        }
        Expr::Bytes(cursor_expr, len) => {
            let target = eval_path_context(cursor_expr, ctx)?;
            let len = as_int(&eval(len, ctx)?)?;
            let bytes = target.read_bytes(len)?;
            Ok(Value::String(Arc::from(bytes.into_boxed_slice())))
        }
        Expr::Str(e) => Ok(Value::String(Arc::from(value_to_string(&eval(e, ctx)?)?.into_bytes().into_boxed_slice()))),
        Expr::Float(e) => Ok(Value::Float(as_float(&eval(e, ctx)?)?)),
        Expr::Int(e) => Ok(Value::Int(as_int_lossy(&eval(e, ctx)?)?)),
        Expr::Time(s, format) => {
            let s = as_string(&eval(s, ctx)?)?;
            let format = as_string(&eval(format, ctx)?)?;
            Ok(Value::Float(parse_time(&s, &format)?))
        }
        Expr::FileSize => Ok(Value::Int(require_ctx(ctx)?.file_size()?)),
        Expr::Filename => Ok(Value::String(Arc::from(
            require_ctx(ctx)?.filename()?.into_bytes().into_boxed_slice(),
        ))),

        Expr::Path(path) => {
            let target = navigate_path(path, ctx)?;
            target.read_value()
        }

        Expr::Index(base, index) => {
            let base = eval(base, ctx)?;
            let index = as_int(&eval(index, ctx)?)?;
            match base {
                Value::String(s) => {
                    let i = index as usize;
                    s.get(i)
                        .map(|b| Value::Int(*b as i64))
                        .ok_or_else(|| CodaError::expression_eval(format!("index {index} out of range")))
                }
                v => Err(type_error("string", &v)),
            }
        }
    }
}

/// True if `expr` can be evaluated with no cursor context at all (folds to a
/// plain literal). Mirrors `coda_expression_is_constant`.
pub fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::BoolLiteral(_) | Expr::IntLiteral(_) | Expr::FloatLiteral(_) | Expr::StringLiteral(_) => true,
        Expr::Identifier(_) | Expr::Path(_) | Expr::FileSize | Expr::Filename | Expr::Bytes(_, _) => false,
        Expr::UnaryMinus(e) | Expr::Not(e) | Expr::Str(e) | Expr::Float(e) | Expr::Int(e) => is_constant(e),
        Expr::Add(a, b)
        | Expr::Sub(a, b)
        | Expr::Mul(a, b)
        | Expr::Div(a, b)
        | Expr::Mod(a, b)
        | Expr::And(a, b)
        | Expr::Or(a, b)
        | Expr::Eq(a, b)
        | Expr::Ne(a, b)
        | Expr::Lt(a, b)
        | Expr::Le(a, b)
        | Expr::Gt(a, b)
        | Expr::Ge(a, b)
        | Expr::Regex(a, b)
        | Expr::Time(a, b)
        | Expr::Index(a, b) => is_constant(a) && is_constant(b),
        Expr::Substr(a, b, c) => is_constant(a) && is_constant(b) && is_constant(c),
    }
}

/// Fold `expr` to a literal `Value` if [`is_constant`] holds for it.
pub fn fold_constant(expr: &Expr) -> Result<Option<Value>> {
    if is_constant(expr) {
        Ok(Some(eval(expr, None)?))
    } else {
        Ok(None)
    }
}

fn require_ctx<'a>(ctx: Option<&'a dyn EvalContext>) -> Result<&'a dyn EvalContext> {
    ctx.ok_or_else(|| CodaError::expression_eval("expression requires cursor context but none was given"))
}

fn navigate_path<'a>(path: &Path, ctx: Option<&'a dyn EvalContext>) -> Result<Box<dyn EvalContext + 'a>> {
    let base = require_ctx(ctx)?;
    let mut resolved = Vec::with_capacity(path.steps.len());
    for step in &path.steps {
        resolved.push(match step {
            PathStep::Field(name) => ResolvedStep::Field(name.clone()),
            PathStep::Attribute(name) => ResolvedStep::Attribute(name.clone()),
            PathStep::Parent => ResolvedStep::Parent,
            PathStep::Index(index_expr) => ResolvedStep::Index(as_int(&eval(index_expr, ctx)?)?),
        });
    }
    base.navigate(&resolved)
}

fn eval_path_context<'a>(expr: &Expr, ctx: Option<&'a dyn EvalContext>) -> Result<Box<dyn EvalContext + 'a>> {
    match expr {
        Expr::Path(path) => navigate_path(path, ctx),
        _ => Err(CodaError::expression_eval("expected a path expression")),
    }
}

fn numeric_binop(
    a: Value,
    b: Value,
    float_op: impl Fn(f64, f64) -> f64,
    int_op: impl Fn(i64, i64) -> Result<i64>,
) -> Result<Value> {
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(*x, *y)?)),
        _ => Ok(Value::Float(float_op(as_float(&a)?, as_float(&b)?))),
    }
}

fn compare(a: Value, b: Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value> {
    let ordering = match (&a, &b) {
        (Value::String(x), Value::String(y)) => x.as_ref().cmp(y.as_ref()),
        _ => as_float(&a)?
            .partial_cmp(&as_float(&b)?)
            .ok_or_else(|| CodaError::expression_eval("comparison with NaN"))?,
    };
    Ok(Value::Bool(accept(ordering)))
}

fn values_equal(a: &Value, b: &Value) -> Result<bool> {
    Ok(match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Void, Value::Void) => true,
        _ => as_float(a)? == as_float(b)?,
    })
}

fn as_bool(v: &Value) -> Result<bool> {
    v.as_bool().ok_or_else(|| type_error("bool", v))
}

fn as_int(v: &Value) -> Result<i64> {
    v.as_int().ok_or_else(|| type_error("int", v))
}

fn as_int_lossy(v: &Value) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        Value::Bool(b) => Ok(*b as i64),
        _ => Err(type_error("int, float, or bool", v)),
    }
}

fn as_float(v: &Value) -> Result<f64> {
    v.as_float().ok_or_else(|| type_error("int or float", v))
}

fn as_string(v: &Value) -> Result<String> {
    v.as_bytes()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .ok_or_else(|| type_error("string", v))
}

fn value_to_string(v: &Value) -> Result<String> {
    Ok(match v {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => String::from_utf8_lossy(s).into_owned(),
        Value::Void => return Err(CodaError::expression_eval("cannot convert void to string")),
    })
}

fn type_error(expected: &str, found: &Value) -> CodaError {
    CodaError::expression_eval(format!("expected a {expected} value, found {}", found.type_name()))
}

/// Parse a timestamp `s` according to a C `strftime`-style `format` into
/// seconds since 2000-01-01T00:00:00 UTC (the library's epoch, per §3 Special
/// "time").
fn parse_time(s: &str, format: &str) -> Result<f64> {
    let chrono_format = translate_time_format(format);
    let naive = chrono::NaiveDateTime::parse_from_str(s, &chrono_format)
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(s, &chrono_format)
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        })
        .map_err(|e| CodaError::expression_eval(format!("could not parse time '{s}' with format '{format}': {e}")))?;

    let epoch = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Ok((naive - epoch).num_milliseconds() as f64 / 1000.0)
}

/// Translate the small subset of C `strftime` directives the codadef time
/// format strings use into `chrono`'s format syntax.
fn translate_time_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(&next) = chars.peek() {
                chars.next();
                out.push('%');
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse;

    #[test]
    fn folds_pure_arithmetic() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(fold_constant(&expr).unwrap(), Some(Value::Int(7)));
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let expr = parse("1 / 0").unwrap();
        assert!(fold_constant(&expr).unwrap_err().to_string().contains("division"));
    }

    #[test]
    fn mixed_int_float_promotes() {
        let expr = parse("1 + 2.5").unwrap();
        assert_eq!(fold_constant(&expr).unwrap(), Some(Value::Float(3.5)));
    }

    #[test]
    fn path_expression_is_not_constant() {
        let expr = parse("./a").unwrap();
        assert!(fold_constant(&expr).unwrap().is_none());
    }

    #[test]
    fn regex_matches() {
        let expr = parse("regex(\"^ab\", \"abc\")").unwrap();
        assert_eq!(fold_constant(&expr).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn substr_slices() {
        let expr = parse("substr(1, 3, \"hello\")").unwrap();
        assert_eq!(
            fold_constant(&expr).unwrap(),
            Some(Value::String(Arc::from(b"ell".to_vec().into_boxed_slice())))
        );
    }

    #[test]
    fn string_comparison() {
        let expr = parse("\"abc\" == \"abc\"").unwrap();
        assert_eq!(fold_constant(&expr).unwrap(), Some(Value::Bool(true)));
    }
}
