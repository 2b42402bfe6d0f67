// ============================================================================
// Module: Value
// Description: The dynamic value type shared by the expression engine,
//              the calculation engine, and rule results.
// Purpose: Give scalars, vectors, and per-timestamp bundles one common shape.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Expressions, calculations, and rule thresholds all traffic in the same
//! small set of shapes: nothing, a boolean, a number, a string, a list, or a
//! time series. Keeping them as one recursive enum (rather than one Rust
//! type per shape) lets the evaluator and the operator registry stay
//! generic over "whatever this rule produced" without a second layer of
//! dynamic typing.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// A single point in a derived per-timestamp series.
///
/// # Invariants
/// - `value` is never itself a [`Value::Series`] — series do not nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Sample timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Sample value at this timestamp.
    pub value: Box<Value>,
}

/// The dynamic value type produced by expressions and calculations.
///
/// # Invariants
/// - `List` elements may themselves be any variant, including further lists.
/// - `Series` values carry one [`SeriesPoint`] per upstream timestamp unless
///   a `diff`-style operator (e.g. `RATE`) has shortened the sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    /// Absence of a value (distinct from a missing variable, which is an error).
    Null,
    /// A boolean scalar.
    Bool(bool),
    /// A 64-bit integer scalar.
    Int(i64),
    /// A floating-point scalar.
    Float(f64),
    /// A string scalar.
    Str(String),
    /// An ordered, possibly heterogeneous, list.
    List(Vec<Value>),
    /// An ordered per-timestamp value bundle.
    Series(Vec<SeriesPoint>),
}

impl Value {
    /// Returns true when the value is numeric (integer or float).
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Returns true when the value is a [`Value::List`].
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns true when the value is a [`Value::Bool`], or a list whose
    /// elements are all boolean.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        match self {
            Self::Bool(_) => true,
            Self::List(items) => !items.is_empty() && items.iter().all(Self::is_boolean),
            _ => false,
        }
    }

    /// Converts the value to its best-effort "truthy" boolean reading.
    ///
    /// Used when a rule's condition does not reduce to a structural
    /// comparison: `null` and empty lists are false, numeric zero is false,
    /// empty strings are false, everything else is true.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            #[allow(clippy::float_cmp, reason = "exact zero check mirrors Python truthiness of 0.0")]
            Self::Float(value) => *value != 0.0,
            Self::Str(value) => !value.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Series(points) => !points.is_empty(),
        }
    }

    /// Returns the numeric value as an `f64`, if this value is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss, reason = "sensor sample magnitudes fit f64 exactly")]
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list items, if this value is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the series points, if this value is a [`Value::Series`].
    #[must_use]
    pub fn as_series(&self) -> Option<&[SeriesPoint]> {
        match self {
            Self::Series(points) => Some(points),
            _ => None,
        }
    }

    /// Strips the timestamp axis from a series, yielding a plain list of
    /// its inner values; passes every other variant through unchanged.
    ///
    /// This realizes the "accessing a `TimeSeries` variable yields the list
    /// of inner values" environment-resolution rule.
    #[must_use]
    pub fn strip_timestamps(self) -> Self {
        match self {
            Self::Series(points) => Self::List(points.into_iter().map(|point| *point.value).collect()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Series(points) => write!(f, "<series of {} points>", points.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}
