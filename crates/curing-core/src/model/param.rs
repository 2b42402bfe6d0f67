// ============================================================================
// Module: ParamValue
// Description: Static configuration-time value type for template and rule
//              parameters, as loaded from YAML before any run starts.
// Purpose: Separate "what a config file can say" from "what an evaluation
//          produces" (see `crate::value::Value`).
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::value::Value;

/// A configuration-time parameter value.
///
/// Unlike [`Value`], this type never carries a time series: parameters are
/// read from YAML before a run exists, so there is no sample data yet to
/// attach timestamps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Absence of a configured value.
    Null,
    /// A boolean parameter.
    Bool(bool),
    /// An integer parameter.
    Int(i64),
    /// A floating-point parameter.
    Float(f64),
    /// A string parameter.
    Str(String),
    /// A list parameter.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns the parameter as an `f64`, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss, reason = "config-time integer parameters fit f64 exactly")]
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the parameter as a string slice, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<ParamValue> for Value {
    fn from(param: ParamValue) -> Self {
        match param {
            ParamValue::Null => Self::Null,
            ParamValue::Bool(value) => Self::Bool(value),
            ParamValue::Int(value) => Self::Int(value),
            ParamValue::Float(value) => Self::Float(value),
            ParamValue::Str(value) => Self::Str(value),
            ParamValue::List(items) => Self::List(items.into_iter().map(Value::from).collect()),
        }
    }
}

/// Looks up a named parameter's numeric reading, falling back to `default`
/// when absent or non-numeric.
#[must_use]
pub fn numeric_or(params: &BTreeMap<String, ParamValue>, key: &str, default: f64) -> f64 {
    params.get(key).and_then(ParamValue::as_f64).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_nested_lists_into_runtime_values() {
        let param = ParamValue::List(vec![ParamValue::Int(1), ParamValue::Bool(true)]);
        let value: Value = param.into();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Bool(true)]));
    }

    #[test]
    fn numeric_or_falls_back_on_missing_key() {
        let params = BTreeMap::new();
        assert!((numeric_or(&params, "min", 3.5) - 3.5).abs() < f64::EPSILON);
    }
}
