// crates/curing-expr/tests/pipeline.rs
// ============================================================================
// Module: Expression Pipeline Tests
// Description: End-to-end lex -> parse -> evaluate coverage for the
//              calculation and rule-condition grammar.
// Purpose: Exercise the full pipeline the way a bound formula actually runs,
//          rather than each stage in isolation.
// ============================================================================

//! End-to-end lex -> parse -> evaluate tests for the expression pipeline.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions and helpers are permitted."
)]

use curing_core::Value;
use curing_expr::evaluator::Environment;
use curing_expr::{parse, TreeEvaluator};

fn eval(source: &str, env: &Environment) -> Value {
    let node = parse(source).unwrap_or_else(|error| panic!("failed to parse `{source}`: {error}"));
    let evaluator = TreeEvaluator::new();
    evaluator
        .evaluate(&node, env)
        .unwrap_or_else(|error| panic!("failed to evaluate `{source}`: {error}"))
}

#[test]
fn arithmetic_precedence_matches_textbook_rules() {
    let env = Environment::new();
    assert_eq!(eval("2 + 3 * 4", &env), Value::Float(14.0));
    assert_eq!(eval("(2 + 3) * 4", &env), Value::Float(20.0));
}

#[test]
fn comparison_against_bound_variable() {
    let mut env = Environment::new();
    env.insert("temperature".to_string(), Value::Float(182.0));
    assert_eq!(eval("temperature > 180", &env), Value::Bool(true));
    assert_eq!(eval("temperature < 180", &env), Value::Bool(false));
}

#[test]
fn threshold_range_membership_via_eq() {
    let mut env = Environment::new();
    env.insert("pressure".to_string(), Value::Float(101.0));
    assert_eq!(eval("EQ(pressure, Threshold(95, 105))", &env), Value::Bool(true));
    assert_eq!(eval("EQ(pressure, Threshold(0, 10))", &env), Value::Bool(false));
}

#[test]
fn series_variable_resolves_to_list_of_values() {
    let mut env = Environment::new();
    env.insert(
        "channel".to_string(),
        Value::Series(vec![
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH,
                value: Box::new(Value::Float(1.0)),
            },
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(1),
                value: Box::new(Value::Float(3.0)),
            },
        ]),
    );
    assert_eq!(eval("MAX(channel)", &env), Value::Float(3.0));
}

#[test]
fn rate_divides_by_elapsed_minutes_between_samples() {
    let mut env = Environment::new();
    env.insert(
        "channel".to_string(),
        Value::Series(vec![
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH,
                value: Box::new(Value::Float(0.0)),
            },
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(2),
                value: Box::new(Value::Float(10.0)),
            },
        ]),
    );
    assert_eq!(eval("RATE(channel)", &env), Value::List(vec![Value::Float(5.0)]));
}

#[test]
fn duration_segments_reports_every_run_with_wall_clock_duration() {
    let mut env = Environment::new();
    env.insert(
        "above_threshold".to_string(),
        Value::Series(vec![
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH,
                value: Box::new(Value::Bool(false)),
            },
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(1),
                value: Box::new(Value::Bool(true)),
            },
            curing_core::SeriesPoint {
                timestamp: time::OffsetDateTime::UNIX_EPOCH + time::Duration::minutes(2),
                value: Box::new(Value::Bool(true)),
            },
        ]),
    );
    let result = eval("DURATION_SEGMENTS(above_threshold)", &env);
    assert_eq!(result, Value::List(vec![Value::List(vec![Value::Int(1), Value::Int(3), Value::Float(1.0)])]));
}

#[test]
fn undefined_variable_surfaces_as_an_eval_error_not_a_panic() {
    let node = parse("missing_sensor + 1").expect("arithmetic over an undefined variable still parses");
    let evaluator = TreeEvaluator::new();
    let result = evaluator.evaluate(&node, &Environment::new());
    assert!(result.is_err());
}

#[test]
fn block_constructs_parse_but_are_rejected_at_evaluation() {
    let node = parse("if (x > 1) { 1; } else { 2; }").expect("block constructs are part of the grammar");
    let evaluator = TreeEvaluator::new();
    assert!(evaluator.evaluate(&node, &Environment::new()).is_err());
}

#[test]
fn named_comparator_broadcasts_over_an_unaggregated_list() {
    let mut env = Environment::new();
    env.insert(
        "thermocouples".to_string(),
        Value::List(vec![Value::Float(90.0), Value::Float(105.0), Value::Float(130.0)]),
    );
    assert_eq!(
        eval("GT(thermocouples, 100)", &env),
        Value::List(vec![Value::Bool(false), Value::Bool(true), Value::Bool(true)])
    );
}

#[test]
fn infix_comparison_zips_two_lists_elementwise() {
    let mut env = Environment::new();
    env.insert("left".to_string(), Value::List(vec![Value::Float(1.0), Value::Float(5.0)]));
    env.insert("right".to_string(), Value::List(vec![Value::Float(2.0), Value::Float(5.0)]));
    assert_eq!(eval("left == right", &env), Value::List(vec![Value::Bool(false), Value::Bool(true)]));
}
