// ============================================================================
// Module: Rule Evaluator
// Description: Evaluates every rule in a bound specification against its
//              assigned stage window, producing one `RuleResult` per rule.
// Purpose: Turn the calculation environment and stage timeline into the
//          compliance report's per-rule verdicts.
// Dependencies: curing-core, curing-expr
// ============================================================================

//! ## Overview
//! A rule evaluates against `global` (the whole run) unless its `stage`
//! field names a detected stage, in which case every time-series variable
//! in the environment is sliced to that stage's `[start, end)` window
//! before the condition runs; scalars pass through untouched. A rule whose
//! `calculation_id` is absent from the environment fails without ever
//! parsing its condition. Every other failure — a parse error, an
//! evaluation error — is also recovered locally into a failed
//! [`curing_core::model::RuleResult`] rather than aborting the run: one bad
//! rule must not take down the rest of the report.

use curing_core::identifiers::StageId;
use curing_core::model::BoundSpecification;
use curing_core::model::ResultAnalysis;
use curing_core::model::RuleDef;
use curing_core::model::RuleResult;
use curing_core::model::StageTimeline;
use curing_core::value::SeriesPoint;
use curing_core::Value;
use curing_expr::analyze;
use curing_expr::evaluator::Environment;
use curing_expr::parse;
use curing_expr::TreeEvaluator;
use time::OffsetDateTime;

/// Evaluates every rule in `specification.0.rules`, in declaration order,
/// against `environment` (the calculation engine's output) and `timeline`
/// (the stage detector's output), stamping each result with `now`.
///
/// Never returns an error: a rule that cannot be evaluated produces a
/// failed [`RuleResult`] carrying the reason in its `message`.
#[must_use]
pub fn evaluate_rules(specification: &BoundSpecification, environment: &Environment, timeline: &StageTimeline, now: OffsetDateTime) -> Vec<RuleResult> {
    let evaluator = TreeEvaluator::new();
    specification.as_specification().rules.iter().map(|rule| evaluate_rule(rule, environment, timeline, &evaluator, now)).collect()
}

fn evaluate_rule(rule: &RuleDef, environment: &Environment, timeline: &StageTimeline, evaluator: &TreeEvaluator, now: OffsetDateTime) -> RuleResult {
    if let Some(calculation_id) = &rule.calculation_id {
        if !environment.contains_key(calculation_id.as_str()) {
            return failed_result(rule, Value::Null, format!("calculation `{calculation_id}` not found in environment"), now);
        }
    }

    let Some(condition) = &rule.condition else {
        return failed_result(rule, Value::Null, "rule has no condition".to_string(), now);
    };

    let scoped = slice_environment(environment, &rule.stage, timeline);

    let node = match parse(condition) {
        Ok(node) => node,
        Err(error) => return failed_result(rule, Value::Null, format!("{condition} failed to parse: {error}"), now),
    };

    let value = match evaluator.evaluate_cached(&node, &scoped, None) {
        Ok(value) => value,
        Err(error) => return failed_result(rule, Value::Null, format!("{condition} failed to evaluate: {error}"), now),
    };

    let analysis = analyze(&value, node.has_comparison());
    let passed = analysis.compliance_result.unwrap_or_else(|| value.truthy());
    let threshold = rule.parameters.get("threshold").cloned().map(Value::from);

    RuleResult {
        rule_id: rule.id.clone(),
        passed,
        actual_value: value,
        threshold,
        severity: rule.severity,
        stage: rule.stage.clone(),
        message: format!("{condition} = {passed}"),
        analysis,
        executed_at: now,
    }
}

fn failed_result(rule: &RuleDef, actual_value: Value, message: String, now: OffsetDateTime) -> RuleResult {
    RuleResult {
        rule_id: rule.id.clone(),
        passed: false,
        actual_value,
        threshold: None,
        severity: rule.severity,
        stage: rule.stage.clone(),
        message,
        analysis: ResultAnalysis::default(),
        executed_at: now,
    }
}

/// Slices every series-valued variable in `environment` down to `stage`'s
/// `[start, end)` window. The `global` sentinel, or a stage absent from
/// `timeline`, leaves the environment untouched. Scalars are never sliced.
fn slice_environment(environment: &Environment, stage: &StageId, timeline: &StageTimeline) -> Environment {
    if stage.as_str() == curing_core::identifiers::GLOBAL_STAGE {
        return environment.clone();
    }
    let Some(window) = timeline.window(stage) else {
        return environment.clone();
    };

    environment
        .iter()
        .map(|(name, value)| {
            let sliced = match value {
                Value::Series(points) => Value::Series(slice_points(points, window.start, window.end)),
                other => other.clone(),
            };
            (name.clone(), sliced)
        })
        .collect()
}

fn slice_points(points: &[SeriesPoint], start: usize, end: usize) -> Vec<SeriesPoint> {
    let end = end.min(points.len());
    let start = start.min(end);
    points[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::BTreeMap;

    use curing_core::identifiers::CalculationId;
    use curing_core::identifiers::RuleId;
    use curing_core::model::Severity;
    use curing_core::model::Specification;
    use curing_core::model::StageFeatures;
    use curing_core::model::StageWindow;
    use time::macros::datetime;

    use super::*;

    fn series(values: &[f64]) -> Value {
        let points = values
            .iter()
            .enumerate()
            .map(|(index, value)| SeriesPoint {
                #[allow(clippy::cast_possible_wrap, reason = "test fixture indices are small")]
                timestamp: datetime!(2026-01-01 00:00:00 UTC) + time::Duration::minutes(index as i64),
                value: Box::new(Value::Float(*value)),
            })
            .collect();
        Value::Series(points)
    }

    fn rule(condition: &str, stage: &str) -> RuleDef {
        RuleDef {
            id: RuleId::new("r1"),
            template_id: None,
            condition: Some(condition.to_string()),
            calculation_id: Some(CalculationId::new("temp")),
            stage: StageId::new(stage),
            severity: Severity::Major,
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn passing_condition_over_global_stage() {
        let mut environment = Environment::new();
        environment.insert("temp".to_string(), series(&[10.0, 20.0, 30.0]));
        let spec = BoundSpecification::new(Specification { id: None, rules: vec![rule("MAX(temp) < 100", "global")], stages: vec![], calculations: vec![] });
        let results = evaluate_rules(&spec, &environment, &StageTimeline::new(), OffsetDateTime::UNIX_EPOCH);
        assert!(results[0].passed);
    }

    #[test]
    fn stage_scoped_rule_slices_the_series() {
        let mut environment = Environment::new();
        environment.insert("temp".to_string(), series(&[10.0, 200.0, 10.0]));
        let mut timeline = StageTimeline::new();
        timeline.insert(StageId::new("hold"), StageWindow { start: 0, end: 1, features: StageFeatures::default() });
        let spec = BoundSpecification::new(Specification { id: None, rules: vec![rule("MAX(temp) < 100", "hold")], stages: vec![], calculations: vec![] });
        let results = evaluate_rules(&spec, &environment, &timeline, OffsetDateTime::UNIX_EPOCH);
        assert!(results[0].passed);
    }

    #[test]
    fn missing_calculation_id_fails_without_evaluating() {
        let environment = Environment::new();
        let spec = BoundSpecification::new(Specification { id: None, rules: vec![rule("MAX(temp) < 100", "global")], stages: vec![], calculations: vec![] });
        let results = evaluate_rules(&spec, &environment, &StageTimeline::new(), OffsetDateTime::UNIX_EPOCH);
        assert!(!results[0].passed);
        assert!(results[0].message.contains("not found"));
    }

    #[test]
    fn parse_failure_is_recovered_into_a_failed_result() {
        let mut environment = Environment::new();
        environment.insert("temp".to_string(), Value::Float(1.0));
        let spec = BoundSpecification::new(Specification { id: None, rules: vec![rule("((", "global")], stages: vec![], calculations: vec![] });
        let results = evaluate_rules(&spec, &environment, &StageTimeline::new(), OffsetDateTime::UNIX_EPOCH);
        assert!(!results[0].passed);
        assert!(results[0].message.contains("failed to parse"));
    }
}
