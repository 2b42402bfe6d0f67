// ============================================================================
// Module: RuleResult & ComplianceReport
// Description: Per-rule outcomes and their aggregation into a run's final
//              compliance report.
// Purpose: Give the rule evaluator and the formatter one shared output
//          shape.
// Dependencies: serde, time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::identifiers::RuleId;
use crate::identifiers::StageId;
use crate::model::specification::Severity;
use crate::value::Value;

/// The structural analysis the expression engine reports alongside a raw
/// evaluation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultAnalysis {
    /// Whether the raw value is numeric (or a list of numerics).
    pub is_numeric: bool,
    /// Whether the raw value is a list.
    pub is_array: bool,
    /// Whether the raw value is boolean (or a list of booleans).
    pub is_boolean: bool,
    /// Whether the condition's AST contains a comparison operator.
    pub has_comparison: bool,
    /// The boolean condensation of the raw value, when one applies.
    pub compliance_result: Option<bool>,
}

/// The outcome of evaluating a single rule.
///
/// # Invariants
/// - When evaluation raised an error, `passed` is `false` and `message`
///   captures the cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    /// The rule that produced this result.
    pub rule_id: RuleId,
    /// Whether the rule's condition was satisfied.
    pub passed: bool,
    /// The raw evaluation result.
    pub actual_value: Value,
    /// The threshold carried in the rule's parameters, if any.
    pub threshold: Option<Value>,
    /// Severity to record on failure.
    pub severity: Severity,
    /// The stage this rule was evaluated against.
    pub stage: StageId,
    /// Human-readable summary, e.g. `"{condition} = {passed}"`.
    pub message: String,
    /// Structural analysis of the raw value.
    pub analysis: ResultAnalysis,
    /// When this rule was evaluated.
    #[serde(with = "time::serde::rfc3339")]
    pub executed_at: OffsetDateTime,
}

/// ISO 8601 timestamps bracketing a run's lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// When the request was received.
    pub request_time: String,
    /// When rule evaluation completed.
    pub execution_time: String,
    /// When the final document was assembled.
    pub generation_time: String,
}

/// The aggregated outcome of a run: per-rule results plus summary counts.
///
/// # Invariants
/// - `total == rules.len()` and `passed + failed == total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Total number of rules evaluated.
    pub total: usize,
    /// Number of rules that passed.
    pub passed: usize,
    /// Number of rules that failed.
    pub failed: usize,
    /// Every rule's individual result.
    pub rules: Vec<RuleResult>,
    /// Run lifecycle timestamps.
    pub timing: Timing,
}

impl ComplianceReport {
    /// Builds a report from a completed rule list, computing the summary
    /// counts from the results themselves.
    #[must_use]
    pub fn from_rules(rules: Vec<RuleResult>, timing: Timing) -> Self {
        let total = rules.len();
        let passed = rules.iter().filter(|rule| rule.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            rules,
            timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(passed: bool) -> RuleResult {
        RuleResult {
            rule_id: RuleId::new("r1"),
            passed,
            actual_value: Value::Bool(passed),
            threshold: None,
            severity: Severity::Major,
            stage: StageId::new("global"),
            message: String::new(),
            analysis: ResultAnalysis::default(),
            executed_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn from_rules_computes_counts() {
        let report = ComplianceReport::from_rules(vec![result(true), result(false), result(true)], Timing::default());
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn from_rules_on_empty_list_is_vacuously_all_passed() {
        let report = ComplianceReport::from_rules(vec![], Timing::default());
        assert_eq!(report.total, 0);
        assert_eq!(report.failed, 0);
    }
}
