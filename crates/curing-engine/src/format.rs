// ============================================================================
// Module: Result Aggregation & Formatting
// Description: Merges a run's per-rule results into the standard-form
//              document external callers consume.
// Purpose: Give every run one reporting shape, independent of how many
//          rule-id prefixes a deployment groups its rules under.
// Dependencies: curing-core, serde, time
// ============================================================================

//! ## Overview
//! A run's rules are grouped by their configured id prefixes (a sensor
//! group's rules typically share one, e.g. `bag_pressure_`) into one
//! `rule_compliance` block per prefix. Only pass/fail/execution-time survive
//! into the document; raw channels and intermediate calculation values never
//! appear in it. A legacy compact timestamp (`YYYYMMDD_HHMMSS`) is converted
//! to RFC 3339 wherever one is supplied; anything else is assumed already
//! well-formed and passed through unchanged.

use std::collections::BTreeMap;

use curing_core::model::ComplianceReport;
use curing_core::model::RuleResult;
use curing_core::model::Timing;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use time::PrimitiveDateTime;

/// The document version stamped into every formatted result.
pub const FORMAT_VERSION: &str = "1.0";

/// Top-level standard-form document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedDocument {
    /// Summary counts across every grouped result.
    pub analysis_summary: AnalysisSummary,
    /// One entry per configured rule-id prefix.
    pub results: Vec<ResultsEntry>,
    /// Run provenance and timing.
    pub metadata: Metadata,
}

/// Run-wide pass/fail summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    /// Total number of rule results across every group.
    pub total_results: usize,
    /// `"pass"` when every rule passed, `"fail"` otherwise.
    pub status: String,
}

/// One rule-id-prefix group's compliance block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsEntry {
    /// The group's aggregated compliance counts and per-rule summaries.
    pub rule_compliance: RuleCompliance,
}

/// Aggregated counts and per-rule summaries for one rule-id-prefix group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleCompliance {
    /// Number of rules in this group.
    pub total_rules: usize,
    /// Number of rules in this group that passed.
    pub passed_rules: usize,
    /// Number of rules in this group that failed.
    pub failed_rules: usize,
    /// Per-rule summaries, keyed by rule id.
    pub rules: BTreeMap<String, RuleSummary>,
}

/// What survives into the document for one rule: never the raw value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    /// The rule's own id, repeated for callers that index by map key.
    pub rule_name: String,
    /// Whether the rule passed.
    pub passed: bool,
    /// When this rule was evaluated, ISO 8601.
    pub execution_time: String,
}

/// Provenance and timing metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// `FORMAT_VERSION`.
    pub format_version: String,
    /// Name of the system producing the document.
    pub generated_by: String,
    /// Name of the algorithm/workflow that produced the results.
    pub algorithm: String,
    /// Run lifecycle timestamps, normalized to ISO 8601.
    pub timing: Timing,
}

/// Groups `report`'s rules by the first matching prefix in
/// `rule_id_prefixes` (declaration order), formatting each group into its
/// own `rule_compliance` block.
///
/// Rules matching no configured prefix are omitted: a deployment that wants
/// every rule represented lists a catch-all empty-string prefix.
#[must_use]
pub fn format_standard(report: &ComplianceReport, rule_id_prefixes: &[String], algorithm: &str, generated_by: &str) -> FormattedDocument {
    let results = rule_id_prefixes
        .iter()
        .map(|prefix| ResultsEntry { rule_compliance: group_by_prefix(&report.rules, prefix) })
        .collect::<Vec<_>>();

    let total_results: usize = results.iter().map(|entry| entry.rule_compliance.total_rules).sum();
    let failed: usize = results.iter().map(|entry| entry.rule_compliance.failed_rules).sum();
    let status = if failed == 0 { "pass" } else { "fail" };

    FormattedDocument {
        analysis_summary: AnalysisSummary { total_results, status: status.to_string() },
        results,
        metadata: Metadata {
            format_version: FORMAT_VERSION.to_string(),
            generated_by: generated_by.to_string(),
            algorithm: algorithm.to_string(),
            timing: normalize_timing(&report.timing),
        },
    }
}

fn group_by_prefix(rules: &[RuleResult], prefix: &str) -> RuleCompliance {
    let matching: Vec<&RuleResult> = rules.iter().filter(|rule| rule.rule_id.as_str().starts_with(prefix)).collect();
    let passed_rules = matching.iter().filter(|rule| rule.passed).count();
    let rules_map = matching
        .iter()
        .map(|rule| {
            let id = rule.rule_id.as_str().to_string();
            (
                id.clone(),
                RuleSummary { rule_name: id, passed: rule.passed, execution_time: now_iso8601(rule.executed_at) },
            )
        })
        .collect();

    RuleCompliance {
        total_rules: matching.len(),
        passed_rules,
        failed_rules: matching.len() - passed_rules,
        rules: rules_map,
    }
}

fn normalize_timing(timing: &Timing) -> Timing {
    Timing {
        request_time: normalize_timestamp(&timing.request_time),
        execution_time: normalize_timestamp(&timing.execution_time),
        generation_time: normalize_timestamp(&timing.generation_time),
    }
}

/// Converts a legacy compact `YYYYMMDD_HHMMSS` timestamp to RFC 3339;
/// anything else is assumed already well-formed and passed through.
fn normalize_timestamp(text: &str) -> String {
    if text.is_empty() {
        return text.to_string();
    }
    let legacy = format_description!("[year][month][day]_[hour][minute][second]");
    match PrimitiveDateTime::parse(text, &legacy) {
        Ok(parsed) => parsed.assume_utc().format(&Rfc3339).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

/// The current instant, ISO 8601, for stamping `Timing` fields at each run
/// lifecycle point.
#[must_use]
pub fn now_iso8601(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use curing_core::identifiers::RuleId;
    use curing_core::identifiers::StageId;
    use curing_core::model::ResultAnalysis;
    use curing_core::model::Severity;
    use curing_core::Value;

    use super::*;

    fn result(id: &str, passed: bool) -> RuleResult {
        RuleResult {
            rule_id: RuleId::new(id),
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
    fn groups_rules_by_configured_prefix() {
        let report = ComplianceReport::from_rules(
            vec![result("bag_pressure_min", true), result("bag_pressure_max", false), result("vacuum_hold", true)],
            Timing::default(),
        );
        let document = format_standard(&report, &["bag_pressure_".to_string(), "vacuum_".to_string()], "autoclave_v1", "curing-engine");
        assert_eq!(document.results[0].rule_compliance.total_rules, 2);
        assert_eq!(document.results[0].rule_compliance.passed_rules, 1);
        assert_eq!(document.results[1].rule_compliance.total_rules, 1);
        assert_eq!(document.analysis_summary.status, "fail");
    }

    #[test]
    fn rule_summary_carries_the_rule_s_own_execution_time() {
        let mut rule = result("a_1", true);
        rule.executed_at = time::macros::datetime!(2026-03-01 12:00:00 UTC);
        let report = ComplianceReport::from_rules(vec![rule], Timing::default());
        let document = format_standard(&report, &["a_".to_string()], "algo", "curing-engine");
        let summary = document.results[0].rule_compliance.rules.get("a_1").expect("rule present in group");
        assert_eq!(summary.execution_time, "2026-03-01T12:00:00Z");
    }

    #[test]
    fn all_passing_reports_pass_status() {
        let report = ComplianceReport::from_rules(vec![result("a_1", true)], Timing::default());
        let document = format_standard(&report, &["a_".to_string()], "algo", "curing-engine");
        assert_eq!(document.analysis_summary.status, "pass");
    }

    #[test]
    fn legacy_compact_timestamp_converts_to_rfc3339() {
        let converted = normalize_timestamp("20260101_143000");
        assert!(converted.starts_with("2026-01-01T14:30:00"));
    }

    #[test]
    fn already_iso8601_timestamp_passes_through() {
        let text = "2026-01-01T14:30:00Z";
        assert_eq!(normalize_timestamp(text), text);
    }
}
