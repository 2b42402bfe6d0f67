// crates/curing-expr/tests/proptest_elementwise.rs
// ============================================================================
// Module: Elementwise Broadcast Property Tests
// Description: Property tests for the operator registry's list/scalar
//              broadcasting law and the comparator's never-panic guarantee.
// Purpose: Detect panics and broadcasting regressions across wide input
//          ranges, the way the comparator's own property suite does.
// ============================================================================

//! Property tests for elementwise broadcasting and comparator panics.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;

use curing_core::Value;
use curing_expr::compare::{compare, CompareOp, ThresholdArg};
use curing_expr::operators::dispatch;
use proptest::prelude::*;

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |value| value.is_finite())
}

proptest! {
    #[test]
    fn add_broadcasts_scalar_elementwise(values in prop::collection::vec(finite_f64(), 0 .. 16), scalar in finite_f64()) {
        let list = Value::List(values.iter().copied().map(Value::Float).collect());
        let result = dispatch("ADD", &[list, Value::Float(scalar)], &BTreeMap::new());
        let Some(Ok(Value::List(items))) = result else {
            prop_assert!(false, "ADD over a list must return a list");
            return Ok(());
        };
        prop_assert_eq!(items.len(), values.len());
        for (item, value) in items.iter().zip(&values) {
            match item {
                Value::Float(sum) => prop_assert!((sum - (value + scalar)).abs() < 1e-9),
                other => prop_assert!(false, "expected a float, got {other:?}"),
            }
        }
    }

    #[test]
    fn mul_broadcast_matches_manual_elementwise_product(values in prop::collection::vec(finite_f64(), 1 .. 16)) {
        let doubled: Vec<Value> = values.iter().map(|value| Value::Float(value * 2.0)).collect();
        let list = Value::List(values.iter().copied().map(Value::Float).collect());
        let result = dispatch("MUL", &[list, Value::Float(2.0)], &BTreeMap::new());
        prop_assert_eq!(result, Some(Ok(Value::List(doubled))));
    }

    #[test]
    fn comparator_never_panics_on_random_numeric_pairs(a in finite_f64(), b in finite_f64()) {
        for op in [CompareOp::Eq, CompareOp::Ne, CompareOp::Gt, CompareOp::Ge, CompareOp::Lt, CompareOp::Le] {
            let _ = compare(op, &Value::Float(a), &ThresholdArg::Scalar(Value::Float(b)));
            let _ = compare(
                op,
                &Value::Float(a),
                &ThresholdArg::Range { min: b.min(a), max: b.max(a) + 1.0, left_open: false, right_open: false },
            );
        }
    }

    #[test]
    fn comparator_gt_and_lt_are_mutually_exclusive(a in finite_f64(), b in finite_f64()) {
        let gt = compare(CompareOp::Gt, &Value::Float(a), &ThresholdArg::Scalar(Value::Float(b))) == Ok(Value::Bool(true));
        let lt = compare(CompareOp::Lt, &Value::Float(a), &ThresholdArg::Scalar(Value::Float(b))) == Ok(Value::Bool(true));
        prop_assert!(!(gt && lt));
    }
}
