// ============================================================================
// Module: Tree Evaluator
// Description: Walks a parsed `Node` against an environment of already-bound
//              variables, producing a dynamic `Value`.
// Purpose: The single place that ties the AST, the comparator, the series
//          operators, and the operator registry together into one
//          evaluation pass, and condenses the result into a pass/fail
//          analysis.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! [`TreeEvaluator::evaluate`] recursively reduces a [`Node`] to a [`Value`].
//! Block constructs are parsed (see [`crate::ast`]) but never evaluated here:
//! reaching one is reported as [`EvalError::BlockNotSupported`]. A small
//! run-local cache, keyed on the formula's structure, the variable names
//! bound in the environment, and the run's timestamp, avoids re-evaluating
//! the same formula against the same bindings twice within a run.
//!
//! [`analyze`] applies the result-condensation rule used throughout the
//! engine: a list produced by a condition containing a structural comparison
//! reduces by requiring every element to be true; a bare boolean or numeric
//! scalar casts directly; anything else carries no compliance verdict.

use std::cell::RefCell;
use std::collections::BTreeMap;

use curing_core::model::ResultAnalysis;
use curing_core::Value;
use time::OffsetDateTime;

use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::compare::{self, CompareOp, ThresholdArg};
use crate::error::EvalError;
use crate::operators;

/// Variable bindings available to a single evaluation.
pub type Environment = BTreeMap<String, Value>;

/// Evaluates parsed formulas against an environment, caching results within
/// one run.
#[derive(Debug, Default)]
pub struct TreeEvaluator {
    cache: RefCell<BTreeMap<String, Value>>,
}

impl TreeEvaluator {
    /// Creates an evaluator with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates `node` against `env`, reusing a cached result computed
    /// earlier in the same run for the same formula, environment keys, and
    /// `context_timestamp`.
    ///
    /// # Errors
    /// See [`Self::evaluate`].
    pub fn evaluate_cached(
        &self,
        node: &Node,
        env: &Environment,
        context_timestamp: Option<OffsetDateTime>,
    ) -> Result<Value, EvalError> {
        let key = fingerprint(node, env, context_timestamp);
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Ok(cached.clone());
        }
        let result = self.evaluate(node, env)?;
        self.cache.borrow_mut().insert(key, result.clone());
        Ok(result)
    }

    /// Recursively reduces `node` to a [`Value`] against `env`.
    ///
    /// # Errors
    /// Returns [`EvalError::UndefinedVariable`] for an unbound identifier,
    /// [`EvalError::UnknownFunction`] for an unrecognized call, a
    /// [`EvalError::TypeError`]/[`EvalError::ShapeMismatch`] for malformed
    /// operands, or [`EvalError::BlockNotSupported`] for any block
    /// construct.
    pub fn evaluate(&self, node: &Node, env: &Environment) -> Result<Value, EvalError> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Variable(name) => env
                .get(name)
                .cloned()
                .map(Value::strip_timestamps)
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Node::List(items) => {
                let values = items.iter().map(|item| self.evaluate(item, env)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            Node::Unary { op, operand } => self.evaluate_unary(*op, operand, env),
            Node::Binary { op, lhs, rhs } => self.evaluate_binary(*op, lhs, rhs, env),
            Node::Call { name, args, kwargs } => self.evaluate_call(name, args, kwargs, env),
            Node::Assign { .. }
            | Node::If { .. }
            | Node::While { .. }
            | Node::For { .. }
            | Node::Switch { .. }
            | Node::Break
            | Node::Continue
            | Node::Return(_) => Err(EvalError::BlockNotSupported),
        }
    }

    fn evaluate_unary(&self, op: UnaryOp, operand: &Node, env: &Environment) -> Result<Value, EvalError> {
        let value = self.evaluate(operand, env)?;
        match op {
            UnaryOp::Neg => negate(&value),
            UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
        }
    }

    fn evaluate_binary(&self, op: BinaryOp, lhs: &Node, rhs: &Node, env: &Environment) -> Result<Value, EvalError> {
        let left = self.evaluate(lhs, env)?;
        let right = self.evaluate(rhs, env)?;
        match op {
            BinaryOp::Add => operators::broadcast_numeric("+", &left, &right, |a, b| Ok(a + b)),
            BinaryOp::Sub => operators::broadcast_numeric("-", &left, &right, |a, b| Ok(a - b)),
            BinaryOp::Mul => operators::broadcast_numeric("*", &left, &right, |a, b| Ok(a * b)),
            BinaryOp::Div => operators::broadcast_numeric("/", &left, &right, |a, b| {
                if b == 0.0 { Err(EvalError::DivisionByZero) } else { Ok(a / b) }
            }),
            BinaryOp::Mod => operators::broadcast_numeric("%", &left, &right, |a, b| {
                if b == 0.0 { Err(EvalError::DivisionByZero) } else { Ok(a % b) }
            }),
            BinaryOp::Eq => compare::compare(CompareOp::Eq, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::Ne => compare::compare(CompareOp::Ne, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::Gt => compare::compare(CompareOp::Gt, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::Ge => compare::compare(CompareOp::Ge, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::Lt => compare::compare(CompareOp::Lt, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::Le => compare::compare(CompareOp::Le, &left, &ThresholdArg::Scalar(right)),
            BinaryOp::And => operators::broadcast_logical("and", &left, &right, |a, b| a && b),
            BinaryOp::Or => operators::broadcast_logical("or", &left, &right, |a, b| a || b),
        }
    }

    fn evaluate_call(
        &self,
        name: &str,
        args: &[Node],
        kwargs: &BTreeMap<String, Node>,
        env: &Environment,
    ) -> Result<Value, EvalError> {
        let upper = name.to_ascii_uppercase();

        if let Some(op) = comparison_op(&upper) {
            let [data_node, threshold_node] = args else {
                return Err(EvalError::ArityMismatch {
                    name: upper,
                    expected: "2 arguments",
                    actual: args.len(),
                });
            };
            let data = self.evaluate(data_node, env)?;
            let threshold = self.evaluate_threshold(threshold_node, env)?;
            return compare::compare(op, &data, &threshold);
        }

        if upper == "IN_RANGE" {
            return self.evaluate_in_range(args, kwargs, env);
        }

        if upper == "RATE" {
            return self.evaluate_rate(args, kwargs, env);
        }

        if upper == "DURATION_SEGMENTS" {
            let value_node = args.first().ok_or_else(|| EvalError::ArityMismatch {
                name: upper.clone(),
                expected: "1 argument",
                actual: args.len(),
            })?;
            let (flags, timestamps) = self.resolve_series_arg(value_node, env)?;
            return operators::duration_segments(&flags, timestamps.as_deref());
        }

        if upper == "THRESHOLD" {
            return Err(EvalError::TypeError {
                context: "THRESHOLD".to_string(),
                detail: "Threshold(...) may only appear as a comparison's threshold argument".to_string(),
            });
        }

        let arg_values = args.iter().map(|arg| self.evaluate(arg, env)).collect::<Result<Vec<_>, _>>()?;
        let mut kwarg_values = BTreeMap::new();
        for (key, node) in kwargs {
            kwarg_values.insert(key.clone(), self.evaluate(node, env)?);
        }

        if let Some(result) = operators::dispatch(&upper, &arg_values, &kwarg_values) {
            return result;
        }

        match upper.as_str() {
            "LEN" => arg_values.first().map_or(
                Err(EvalError::ArityMismatch {
                    name: upper.clone(),
                    expected: "1 argument",
                    actual: arg_values.len(),
                }),
                |value| match value {
                    Value::List(items) => Ok(Value::Int(i64::try_from(items.len()).unwrap_or(i64::MAX))),
                    other => Err(EvalError::TypeError {
                        context: upper.clone(),
                        detail: format!("{other} has no length"),
                    }),
                },
            ),
            "ABS" => arg_values.first().map_or(
                Err(EvalError::ArityMismatch {
                    name: upper.clone(),
                    expected: "1 argument",
                    actual: arg_values.len(),
                }),
                |value| {
                    value
                        .as_f64()
                        .map(|number| Value::Float(number.abs()))
                        .ok_or_else(|| operators::numeric_error(&upper, value))
                },
            ),
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    fn evaluate_threshold(&self, node: &Node, env: &Environment) -> Result<ThresholdArg, EvalError> {
        if let Node::Call { name, args, kwargs } = node {
            if name.eq_ignore_ascii_case("Threshold") {
                return self.evaluate_threshold_call(args, kwargs, env);
            }
        }
        self.evaluate(node, env).map(ThresholdArg::Scalar)
    }

    fn evaluate_threshold_call(
        &self,
        args: &[Node],
        kwargs: &BTreeMap<String, Node>,
        env: &Environment,
    ) -> Result<ThresholdArg, EvalError> {
        let min = self.positional_numeric("Threshold", args, kwargs, 0, "min", None, env)?;
        let max = self.positional_numeric("Threshold", args, kwargs, 1, "max", None, env)?;
        let left_open = self.positional_bool(args, kwargs, 2, "left_open", env)?;
        let right_open = self.positional_bool(args, kwargs, 3, "right_open", env)?;
        Ok(ThresholdArg::Range {
            min,
            max,
            left_open,
            right_open,
        })
    }

    fn evaluate_in_range(&self, args: &[Node], kwargs: &BTreeMap<String, Node>, env: &Environment) -> Result<Value, EvalError> {
        let data_node = args.first().ok_or_else(|| EvalError::ArityMismatch {
            name: "IN_RANGE".to_string(),
            expected: "at least 3 arguments",
            actual: args.len(),
        })?;
        let data = self.evaluate(data_node, env)?;
        let min = self.positional_numeric("IN_RANGE", args, kwargs, 1, "lower", None, env)?;
        let max = self.positional_numeric("IN_RANGE", args, kwargs, 2, "upper", None, env)?;
        let left_open = self.positional_bool(args, kwargs, 3, "left_open", env)?;
        let right_open = self.positional_bool(args, kwargs, 4, "right_open", env)?;
        compare::in_range(&data, min, max, left_open, right_open)
    }

    fn evaluate_rate(&self, args: &[Node], kwargs: &BTreeMap<String, Node>, env: &Environment) -> Result<Value, EvalError> {
        let value_node = args.first().ok_or_else(|| EvalError::ArityMismatch {
            name: "RATE".to_string(),
            expected: "at least 1 argument",
            actual: args.len(),
        })?;
        let (values, timestamps) = self.resolve_series_arg(value_node, env)?;
        let step = self.positional_numeric("RATE", args, kwargs, 1, "step", Some(1.0), env)?;
        operators::rate(&values, &Value::Float(step), timestamps.as_deref())
    }

    fn resolve_series_arg(&self, node: &Node, env: &Environment) -> Result<(Value, Option<Vec<OffsetDateTime>>), EvalError> {
        if let Node::Variable(name) = node {
            if let Some(Value::Series(points)) = env.get(name) {
                let values = Value::List(points.iter().map(|point| (*point.value).clone()).collect());
                let timestamps = points.iter().map(|point| point.timestamp).collect();
                return Ok((values, Some(timestamps)));
            }
        }
        Ok((self.evaluate(node, env)?, None))
    }

    #[allow(clippy::too_many_arguments, reason = "mirrors positional-then-keyword argument resolution used across every call site")]
    fn positional_numeric(
        &self,
        context: &str,
        args: &[Node],
        kwargs: &BTreeMap<String, Node>,
        index: usize,
        key: &str,
        default: Option<f64>,
        env: &Environment,
    ) -> Result<f64, EvalError> {
        let node = args.get(index).or_else(|| kwargs.get(key));
        match node {
            Some(node) => self
                .evaluate(node, env)?
                .as_f64()
                .ok_or_else(|| EvalError::TypeError {
                    context: context.to_string(),
                    detail: format!("`{key}` must be numeric"),
                }),
            None => default.ok_or_else(|| EvalError::ArityMismatch {
                name: context.to_string(),
                expected: "a numeric argument",
                actual: args.len(),
            }),
        }
    }

    fn positional_bool(&self, args: &[Node], kwargs: &BTreeMap<String, Node>, index: usize, key: &str, env: &Environment) -> Result<bool, EvalError> {
        match args.get(index).or_else(|| kwargs.get(key)) {
            Some(node) => Ok(self.evaluate(node, env)?.truthy()),
            None => Ok(false),
        }
    }
}

fn comparison_op(upper: &str) -> Option<CompareOp> {
    match upper {
        "EQ" => Some(CompareOp::Eq),
        "NE" => Some(CompareOp::Ne),
        "GT" => Some(CompareOp::Gt),
        "GE" => Some(CompareOp::Ge),
        "LT" => Some(CompareOp::Lt),
        "LE" => Some(CompareOp::Le),
        _ => None,
    }
}

fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::List(items) => Ok(Value::List(items.iter().map(negate).collect::<Result<_, _>>()?)),
        other => other
            .as_f64()
            .map(|number| Value::Float(-number))
            .ok_or_else(|| operators::numeric_error("-", other)),
    }
}

fn fingerprint(node: &Node, env: &Environment, context_timestamp: Option<OffsetDateTime>) -> String {
    let keys: Vec<&str> = env.keys().map(String::as_str).collect();
    let timestamp = context_timestamp.map_or(-1, OffsetDateTime::unix_timestamp);
    format!("{node:?}|{keys:?}|{timestamp}")
}

/// Condenses an evaluated [`Value`] into a [`ResultAnalysis`], applying the
/// engine's result-condensation rule: a list produced by a
/// structural-comparison condition passes only if every element is true; a
/// bare boolean or numeric scalar casts directly to its truthiness; anything
/// else carries no verdict.
#[must_use]
pub fn analyze(value: &Value, has_comparison: bool) -> ResultAnalysis {
    let is_numeric = value.is_numeric();
    let is_array = value.is_array();
    let is_boolean = value.is_boolean();
    let compliance_result = if is_array && has_comparison {
        value.as_list().map(|items| items.iter().all(Value::truthy))
    } else if is_boolean || is_numeric {
        Some(value.truthy())
    } else {
        None
    };
    ResultAnalysis {
        is_numeric,
        is_array,
        is_boolean,
        has_comparison,
        compliance_result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, Value)]) -> Environment {
        pairs.iter().map(|(key, value)| ((*key).to_string(), value.clone())).collect()
    }

    #[test]
    fn evaluates_arithmetic_expression() {
        let evaluator = TreeEvaluator::new();
        let node = Node::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Node::Literal(Value::Int(2))),
            rhs: Box::new(Node::Literal(Value::Int(3))),
        };
        assert_eq!(evaluator.evaluate(&node, &Environment::new()), Ok(Value::Float(5.0)));
    }

    #[test]
    fn variable_lookup_strips_series_timestamps() {
        let evaluator = TreeEvaluator::new();
        let env = env_with(&[("temp", Value::Series(vec![]))]);
        let node = Node::Variable("temp".to_string());
        assert_eq!(evaluator.evaluate(&node, &env), Ok(Value::List(vec![])));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let evaluator = TreeEvaluator::new();
        let node = Node::Variable("missing".to_string());
        assert_eq!(
            evaluator.evaluate(&node, &Environment::new()),
            Err(EvalError::UndefinedVariable("missing".to_string()))
        );
    }

    #[test]
    fn block_constructs_are_rejected() {
        let evaluator = TreeEvaluator::new();
        assert_eq!(evaluator.evaluate(&Node::Break, &Environment::new()), Err(EvalError::BlockNotSupported));
    }

    #[test]
    fn eq_call_with_threshold_constructor_is_a_range_membership_test() {
        let evaluator = TreeEvaluator::new();
        let node = Node::Call {
            name: "EQ".to_string(),
            args: vec![
                Node::Literal(Value::Float(15.0)),
                Node::Call {
                    name: "Threshold".to_string(),
                    args: vec![Node::Literal(Value::Int(10)), Node::Literal(Value::Int(20))],
                    kwargs: BTreeMap::new(),
                },
            ],
            kwargs: BTreeMap::new(),
        };
        assert_eq!(evaluator.evaluate(&node, &Environment::new()), Ok(Value::Bool(true)));
    }

    #[test]
    fn analyze_reduces_a_comparison_list_with_all() {
        let value = Value::List(vec![Value::Bool(true), Value::Bool(true)]);
        let analysis = analyze(&value, true);
        assert_eq!(analysis.compliance_result, Some(true));
    }

    #[test]
    fn analyze_reduces_a_comparison_list_with_a_false_element() {
        let value = Value::List(vec![Value::Bool(true), Value::Bool(false)]);
        let analysis = analyze(&value, true);
        assert_eq!(analysis.compliance_result, Some(false));
    }

    #[test]
    fn analyze_falls_back_to_null_for_non_boolean_scalars() {
        let analysis = analyze(&Value::Str("idle".to_string()), false);
        assert_eq!(analysis.compliance_result, None);
    }

    #[test]
    fn evaluation_is_cached_across_calls() {
        let evaluator = TreeEvaluator::new();
        let node = Node::Literal(Value::Int(7));
        let env = Environment::new();
        assert_eq!(evaluator.evaluate_cached(&node, &env, None), Ok(Value::Int(7)));
        assert_eq!(evaluator.evaluate_cached(&node, &env, None), Ok(Value::Int(7)));
    }
}
