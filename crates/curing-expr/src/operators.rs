// ============================================================================
// Module: Operator Registry
// Description: The process-wide table of named operators the evaluator
//              consults before falling back to built-ins.
// Purpose: Dispatch aggregate, comparison, math, logical, and series
//          operators by case-insensitive name.
// Dependencies: curing-core, crate::compare, crate::series_ops
// ============================================================================

//! ## Overview
//! `dispatch` is the single entry point: given an uppercased operator name,
//! already-evaluated positional values, and keyword values, it either
//! produces a result or reports the name as unrecognized so the evaluator
//! can fall through to the built-ins (`all`, `any`, `len`, `abs`) or, for
//! comparisons, to its `Threshold(...)`-aware argument handling.

use std::collections::BTreeMap;

use curing_core::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::EvalError;
use crate::series_ops;

/// Looks up `name` (already uppercased) among the aggregate, math, logical,
/// and vector operators, evaluating it against already-computed `args`.
///
/// Returns `None` when `name` is not one of this registry's operators, so
/// callers can fall back to built-ins. Comparison operators (`EQ`, `IN_RANGE`,
/// ...) and `RATE`/`DURATION_SEGMENTS` are handled separately by the
/// evaluator, since they need either `Threshold(...)`-aware argument
/// handling or a timestamp axis that only the evaluator's environment holds.
///
/// # Errors
/// Returns `Some(Err(...))` when the operator is recognized but its
/// arguments are malformed.
pub fn dispatch(name: &str, args: &[Value], kwargs: &BTreeMap<String, Value>) -> Option<Result<Value, EvalError>> {
    match name {
        "MAX" => Some(aggregate(name, args, f64::max, f64::NEG_INFINITY)),
        "MIN" => Some(aggregate(name, args, f64::min, f64::INFINITY)),
        "SUM" => Some(sum(name, args)),
        "AVG" | "MEAN" => Some(average(name, args)),
        "FIRST" => Some(edge(name, args, true)),
        "LAST" => Some(edge(name, args, false)),
        "ADD" => Some(arithmetic(name, args, |a, b| Ok(a + b))),
        "SUB" => Some(arithmetic(name, args, |a, b| Ok(a - b))),
        "MUL" => Some(arithmetic(name, args, |a, b| Ok(a * b))),
        "DIV" => Some(arithmetic(name, args, |a, b| {
            if b == 0.0 { Err(EvalError::DivisionByZero) } else { Ok(a / b) }
        })),
        "AND" => Some(logical(name, args, |a, b| a && b)),
        "OR" => Some(logical(name, args, |a, b| a || b)),
        "NOT" => Some(not(name, args)),
        "ALL" => Some(all_any(name, args, true)),
        "ANY" => Some(all_any(name, args, false)),
        _ => {
            let _ = kwargs;
            None
        }
    }
}

fn flatten_numeric(name: &str, args: &[Value]) -> Result<Vec<f64>, EvalError> {
    let first = args.first().ok_or_else(|| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: "at least 1 argument",
        actual: args.len(),
    })?;
    collect_numeric(name, first)
}

fn collect_numeric(name: &str, value: &Value) -> Result<Vec<f64>, EvalError> {
    match value {
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(collect_numeric(name, item)?);
            }
            Ok(out)
        }
        other => other.as_f64().map(|value| vec![value]).ok_or_else(|| EvalError::TypeError {
            context: name.to_string(),
            detail: format!("{other} is not numeric"),
        }),
    }
}

fn aggregate(name: &str, args: &[Value], fold: impl Fn(f64, f64) -> f64, seed: f64) -> Result<Value, EvalError> {
    let values = flatten_numeric(name, args)?;
    if values.is_empty() {
        return Err(EvalError::TypeError {
            context: name.to_string(),
            detail: "cannot aggregate an empty list".to_string(),
        });
    }
    Ok(Value::Float(values.into_iter().fold(seed, fold)))
}

fn sum(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let values = flatten_numeric(name, args)?;
    Ok(Value::Float(values.into_iter().sum()))
}

fn average(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let values = flatten_numeric(name, args)?;
    if values.is_empty() {
        return Err(EvalError::TypeError {
            context: name.to_string(),
            detail: "cannot average an empty list".to_string(),
        });
    }
    #[allow(clippy::cast_precision_loss, reason = "series lengths are far below f64's exact-integer range")]
    let count = values.len() as f64;
    Ok(Value::Float(values.into_iter().sum::<f64>() / count))
}

fn edge(name: &str, args: &[Value], first: bool) -> Result<Value, EvalError> {
    let value = args.first().ok_or_else(|| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: "1 argument",
        actual: args.len(),
    })?;
    let Value::List(items) = value else {
        return Ok(value.clone());
    };
    let picked = if first { items.first() } else { items.last() };
    picked.cloned().ok_or_else(|| EvalError::TypeError {
        context: name.to_string(),
        detail: "cannot take an edge of an empty list".to_string(),
    })
}

fn arithmetic(name: &str, args: &[Value], op: impl Fn(f64, f64) -> Result<f64, EvalError> + Copy) -> Result<Value, EvalError> {
    let (lhs, rhs) = two_args(name, args)?;
    broadcast_numeric(name, lhs, rhs, op)
}

pub(crate) fn broadcast_numeric(
    name: &str,
    lhs: &Value,
    rhs: &Value,
    op: impl Fn(f64, f64) -> Result<f64, EvalError> + Copy,
) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::List(left), Value::List(right)) => {
            if left.len() != right.len() {
                return Err(EvalError::ShapeMismatch {
                    context: name.to_string(),
                    detail: format!("lists of length {} and {}", left.len(), right.len()),
                });
            }
            let items = left
                .iter()
                .zip(right)
                .map(|(a, b)| broadcast_numeric(name, a, b, op))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        (Value::List(left), scalar) => {
            let items = left
                .iter()
                .map(|item| broadcast_numeric(name, item, scalar, op))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        (scalar, Value::List(right)) => {
            let items = right
                .iter()
                .map(|item| broadcast_numeric(name, scalar, item, op))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        (left, right) => {
            let (a, b) = (
                left.as_f64().ok_or_else(|| numeric_error(name, left))?,
                right.as_f64().ok_or_else(|| numeric_error(name, right))?,
            );
            op(a, b).map(Value::Float)
        }
    }
}

pub(crate) fn numeric_error(name: &str, value: &Value) -> EvalError {
    EvalError::TypeError {
        context: name.to_string(),
        detail: format!("{value} is not numeric"),
    }
}

fn two_args<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), EvalError> {
    match args {
        [lhs, rhs] => Ok((lhs, rhs)),
        _ => Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected: "2 arguments",
            actual: args.len(),
        }),
    }
}

fn logical(name: &str, args: &[Value], op: impl Fn(bool, bool) -> bool + Copy) -> Result<Value, EvalError> {
    let (lhs, rhs) = two_args(name, args)?;
    broadcast_logical(name, lhs, rhs, op)
}

pub(crate) fn broadcast_logical(name: &str, lhs: &Value, rhs: &Value, op: impl Fn(bool, bool) -> bool + Copy) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::List(left), Value::List(right)) => {
            if left.len() != right.len() {
                return Err(EvalError::ShapeMismatch {
                    context: name.to_string(),
                    detail: format!("lists of length {} and {}", left.len(), right.len()),
                });
            }
            let items = left
                .iter()
                .zip(right)
                .map(|(a, b)| broadcast_logical(name, a, b, op))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(items))
        }
        (left, right) => Ok(Value::Bool(op(left.truthy(), right.truthy()))),
    }
}

fn not(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let value = args.first().ok_or_else(|| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: "1 argument",
        actual: args.len(),
    })?;
    match value {
        Value::List(items) => Ok(Value::List(items.iter().map(|item| Value::Bool(!item.truthy())).collect())),
        other => Ok(Value::Bool(!other.truthy())),
    }
}

fn all_any(name: &str, args: &[Value], all: bool) -> Result<Value, EvalError> {
    let value = args.first().ok_or_else(|| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: "1 argument",
        actual: args.len(),
    })?;
    let Value::List(items) = value else {
        return Ok(Value::Bool(value.truthy()));
    };
    Ok(Value::Bool(if all {
        items.iter().all(Value::truthy)
    } else {
        items.iter().any(Value::truthy)
    }))
}

/// Evaluates `RATE(values, step=1)` against already-evaluated arguments and
/// an optional timestamp axis resolved by the caller.
///
/// # Errors
/// See [`series_ops::rate`].
pub fn rate(values: &Value, step: &Value, timestamps: Option<&[OffsetDateTime]>) -> Result<Value, EvalError> {
    let values = collect_numeric("RATE", values)?;
    #[allow(clippy::cast_sign_loss, reason = "step is validated non-negative by series_ops::rate before use")]
    let step = step.as_f64().unwrap_or(1.0).max(0.0) as usize;
    let rates = series_ops::rate(&values, timestamps, step)?;
    Ok(Value::List(rates.into_iter().map(Value::Float).collect()))
}

/// Evaluates `DURATION_SEGMENTS(flags)` against an already-evaluated boolean
/// list and an optional timestamp axis resolved by the caller.
///
/// # Errors
/// Returns [`EvalError::TypeError`] if `flags` is not a list.
pub fn duration_segments(flags: &Value, timestamps: Option<&[OffsetDateTime]>) -> Result<Value, EvalError> {
    let Value::List(items) = flags else {
        return Err(EvalError::TypeError {
            context: "DURATION_SEGMENTS".to_string(),
            detail: "expected a boolean list".to_string(),
        });
    };
    let flags: Vec<bool> = items.iter().map(Value::truthy).collect();
    let segments = series_ops::duration_segments(&flags, timestamps);
    Ok(Value::List(segments.iter().map(series_ops::Segment::to_value).collect()))
}

/// Parses a value as an RFC 3339 timestamp, for operators that accept a
/// timestamps argument as a plain string list rather than a `Value::Series`.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::Str(text) => OffsetDateTime::parse(text, &Rfc3339).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_picks_the_largest_element() {
        let result = dispatch("MAX", &[Value::List(vec![Value::Int(3), Value::Int(9), Value::Int(1)])], &BTreeMap::new());
        assert_eq!(result, Some(Ok(Value::Float(9.0))));
    }

    #[test]
    fn div_by_zero_is_an_error() {
        let result = dispatch("DIV", &[Value::Int(1), Value::Int(0)], &BTreeMap::new());
        assert_eq!(result, Some(Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn add_broadcasts_scalar_over_list() {
        let result = dispatch(
            "ADD",
            &[Value::List(vec![Value::Int(1), Value::Int(2)]), Value::Int(10)],
            &BTreeMap::new(),
        );
        assert_eq!(result, Some(Ok(Value::List(vec![Value::Float(11.0), Value::Float(12.0)]))));
    }

    #[test]
    fn all_requires_every_element_truthy() {
        let result = dispatch("ALL", &[Value::List(vec![Value::Bool(true), Value::Bool(false)])], &BTreeMap::new());
        assert_eq!(result, Some(Ok(Value::Bool(false))));
    }

    #[test]
    fn unknown_operator_returns_none() {
        assert_eq!(dispatch("FROBNICATE", &[], &BTreeMap::new()), None);
    }
}
