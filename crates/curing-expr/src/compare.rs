// ============================================================================
// Module: Comparators
// Description: Shared comparison semantics for EQ/NE/GT/GE/LT/LE/IN_RANGE,
//              decimal-safe for numbers and RFC3339-aware for timestamps.
// Purpose: Give every comparison-shaped operator (both the infix operators
//          and their named synonyms) one implementation.
// Dependencies: bigdecimal, time, curing-core
// ============================================================================

//! ## Overview
//! The AST's infix comparison operators (`== != > >= < <=`) and the
//! registry's named synonyms (`EQ`, `NE`, `GT`, ...) both funnel into
//! [`compare`], which translates a `(data, operator, threshold)` triple into
//! an elementwise boolean result. Equality on numbers round-trips both
//! operands through [`bigdecimal::BigDecimal`] so that values whose decimal
//! text matches compare equal even when their `f64` bit patterns would not
//! (the same decimal-safe idiom the workspace uses for trust-sensitive
//! numeric comparisons).

use std::str::FromStr;

use bigdecimal::BigDecimal;
use curing_core::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::EvalError;

/// One of the six structural comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl CompareOp {
    /// The operator's name, as used for error messages and registry lookup.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Le => "LE",
        }
    }
}

/// The threshold half of a comparison: either a plain scalar, or a `Threshold(min, max, ...)` range object.
#[derive(Debug, Clone, PartialEq)]
pub enum ThresholdArg {
    /// A plain scalar value to compare against.
    Scalar(Value),
    /// A `min..max` range, as constructed by the `Threshold(...)` built-in.
    Range {
        /// Range lower bound.
        min: f64,
        /// Range upper bound.
        max: f64,
        /// Whether `min` itself is excluded.
        left_open: bool,
        /// Whether `max` itself is excluded.
        right_open: bool,
    },
}

/// Compares `data` against `threshold` elementwise, broadcasting a scalar
/// threshold over a list `data`, and zipping a list `data` against a list
/// threshold position by position.
///
/// # Errors
/// Returns [`EvalError::ShapeMismatch`] when both `data` and `threshold` are
/// lists of unequal length. Returns [`EvalError::TypeError`] when the
/// operands are not comparable (e.g. comparing a string to a number), or
/// when `threshold` is a [`ThresholdArg::Range`] paired with an operator
/// other than [`CompareOp::Eq`]/[`CompareOp::Ne`].
pub fn compare(op: CompareOp, data: &Value, threshold: &ThresholdArg) -> Result<Value, EvalError> {
    if let (Value::List(left), ThresholdArg::Scalar(Value::List(right))) = (data, threshold) {
        if left.len() != right.len() {
            return Err(EvalError::ShapeMismatch {
                context: op.name().to_string(),
                detail: format!("lists of length {} and {}", left.len(), right.len()),
            });
        }
        let results = left
            .iter()
            .zip(right)
            .map(|(a, b)| compare_one(op, a, &ThresholdArg::Scalar(b.clone())).map(Value::Bool))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(results));
    }
    match data {
        Value::List(items) => {
            let results = items
                .iter()
                .map(|item| compare_one(op, item, threshold).map(Value::Bool))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(results))
        }
        scalar => compare_one(op, scalar, threshold).map(Value::Bool),
    }
}

/// Compares one scalar `data` value against `threshold`.
///
/// # Errors
/// See [`compare`].
pub fn compare_one(op: CompareOp, data: &Value, threshold: &ThresholdArg) -> Result<bool, EvalError> {
    match threshold {
        ThresholdArg::Scalar(scalar) => compare_scalar(op, data, scalar),
        ThresholdArg::Range {
            min,
            max,
            left_open,
            right_open,
        } => {
            let inside = in_range_scalar(data, *min, *max, *left_open, *right_open)?;
            match op {
                CompareOp::Eq => Ok(inside),
                CompareOp::Ne => Ok(!inside),
                _ => Err(EvalError::TypeError {
                    context: op.name().to_string(),
                    detail: "a Threshold(min, max, ...) range only supports EQ/NE".to_string(),
                }),
            }
        }
    }
}

fn compare_scalar(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    if let (Some(left), Some(right)) = (lhs.as_f64(), rhs.as_f64()) {
        return Ok(compare_numbers(op, left, right));
    }
    if let (Value::Str(left), Value::Str(right)) = (lhs, rhs) {
        if let (Ok(left_time), Ok(right_time)) = (
            OffsetDateTime::parse(left, &Rfc3339),
            OffsetDateTime::parse(right, &Rfc3339),
        ) {
            return Ok(compare_ordering(op, left_time.cmp(&right_time)));
        }
        return Ok(compare_ordering(op, left.cmp(right)));
    }
    if let (Value::Bool(left), Value::Bool(right)) = (lhs, rhs) {
        return Ok(compare_ordering(op, left.cmp(right)));
    }
    Err(EvalError::TypeError {
        context: op.name().to_string(),
        detail: format!("cannot compare {lhs} and {rhs}"),
    })
}

fn compare_numbers(op: CompareOp, left: f64, right: f64) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = decimal_safe_eq(left, right);
            if op == CompareOp::Eq { equal } else { !equal }
        }
        CompareOp::Gt => left > right,
        CompareOp::Ge => left >= right,
        CompareOp::Lt => left < right,
        CompareOp::Le => left <= right,
    }
}

fn decimal_safe_eq(left: f64, right: f64) -> bool {
    let parsed = BigDecimal::from_str(&left.to_string()).and_then(|left_decimal| {
        BigDecimal::from_str(&right.to_string()).map(|right_decimal| left_decimal == right_decimal)
    });
    parsed.unwrap_or(false)
}

const fn compare_ordering(op: CompareOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match op {
        CompareOp::Eq => matches!(ordering, Equal),
        CompareOp::Ne => !matches!(ordering, Equal),
        CompareOp::Gt => matches!(ordering, Greater),
        CompareOp::Ge => matches!(ordering, Greater | Equal),
        CompareOp::Lt => matches!(ordering, Less),
        CompareOp::Le => matches!(ordering, Less | Equal),
    }
}

/// Evaluates `IN_RANGE(data, lower, upper, left_open?, right_open?)`,
/// broadcasting over list `data`.
///
/// # Errors
/// Returns [`EvalError::TypeError`] if `data` is not numeric (or a list of
/// numerics).
pub fn in_range(data: &Value, min: f64, max: f64, left_open: bool, right_open: bool) -> Result<Value, EvalError> {
    match data {
        Value::List(items) => {
            let results = items
                .iter()
                .map(|item| in_range_scalar(item, min, max, left_open, right_open).map(Value::Bool))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(results))
        }
        scalar => in_range_scalar(scalar, min, max, left_open, right_open).map(Value::Bool),
    }
}

fn in_range_scalar(data: &Value, min: f64, max: f64, left_open: bool, right_open: bool) -> Result<bool, EvalError> {
    let value = data.as_f64().ok_or_else(|| EvalError::TypeError {
        context: "IN_RANGE".to_string(),
        detail: format!("{data} is not numeric"),
    })?;
    let lower_ok = if left_open { value > min } else { value >= min };
    let upper_ok = if right_open { value < max } else { value <= max };
    Ok(lower_ok && upper_ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_safe_equality_survives_float_rounding() {
        assert!(decimal_safe_eq(0.1 + 0.2, 0.3));
    }

    #[test]
    fn compare_numbers_handles_ordering() {
        assert!(compare_numbers(CompareOp::Gt, 5.0, 3.0));
        assert!(!compare_numbers(CompareOp::Lt, 5.0, 3.0));
    }

    #[test]
    fn in_range_respects_open_bounds() {
        assert_eq!(in_range_scalar(&Value::Float(10.0), 10.0, 20.0, true, false), Ok(false));
        assert_eq!(in_range_scalar(&Value::Float(10.0), 10.0, 20.0, false, false), Ok(true));
    }

    #[test]
    fn compare_broadcasts_scalar_threshold_over_list() {
        let data = Value::List(vec![Value::Int(1), Value::Int(5), Value::Int(10)]);
        let result = compare(CompareOp::Gt, &data, &ThresholdArg::Scalar(Value::Int(4)));
        assert_eq!(
            result,
            Ok(Value::List(vec![Value::Bool(false), Value::Bool(true), Value::Bool(true)]))
        );
    }

    #[test]
    fn compare_zips_two_lists_elementwise() {
        let left = Value::List(vec![Value::Int(1), Value::Int(5), Value::Int(10)]);
        let right = Value::List(vec![Value::Int(2), Value::Int(5), Value::Int(9)]);
        let result = compare(CompareOp::Gt, &left, &ThresholdArg::Scalar(right));
        assert_eq!(
            result,
            Ok(Value::List(vec![Value::Bool(false), Value::Bool(false), Value::Bool(true)]))
        );
    }

    #[test]
    fn compare_rejects_mismatched_list_lengths() {
        let left = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let right = Value::List(vec![Value::Int(1)]);
        let result = compare(CompareOp::Eq, &left, &ThresholdArg::Scalar(right));
        assert!(matches!(result, Err(EvalError::ShapeMismatch { .. })));
    }

    #[test]
    fn range_threshold_only_supports_eq_ne() {
        let result = compare_one(
            CompareOp::Gt,
            &Value::Float(5.0),
            &ThresholdArg::Range {
                min: 0.0,
                max: 10.0,
                left_open: false,
                right_open: false,
            },
        );
        assert!(result.is_err());
    }
}
