// ============================================================================
// Module: Engine Errors
// Description: Failures raised by the calculation engine and stage detector.
//              Rule evaluation failures are recovered locally into
//              `RuleResult` and never surface here.
// Purpose: Distinguish run-fatal configuration errors from the per-rule
//          local recovery the rule evaluator performs on its own.
// Dependencies: thiserror, curing-expr
// ============================================================================

//! Errors raised by the calculation engine and stage detector.

use thiserror::Error;

/// Failures raised while evaluating a `BoundSpecification`'s calculations.
///
/// Unlike rule-condition failures, these abort the run: a calculation feeds
/// every downstream rule, so a broken calculation cannot be locally
/// recovered the way a single rule's bad condition can.
#[derive(Debug, Error)]
pub enum CalcError {
    /// A calculation referenced a sensor group absent from the run's
    /// grouping.
    #[error("calculation `{calculation_id}` references undefined sensor group `{group}`")]
    UndefinedSensorGroup {
        /// The calculation that made the reference.
        calculation_id: String,
        /// The missing group's name.
        group: String,
    },
    /// Reading a raw channel failed (missing timestamp channel, length
    /// mismatch, unparseable timestamp).
    #[error("calculation `{calculation_id}` could not read raw data: {source}")]
    RawData {
        /// The calculation being computed.
        calculation_id: String,
        /// Underlying raw-data failure.
        #[source]
        source: curing_core::model::RawDataError,
    },
    /// A calculation's formula failed to parse.
    #[error("calculation `{calculation_id}` formula failed to parse: {source}")]
    Parse {
        /// The calculation whose formula failed to parse.
        calculation_id: String,
        /// Underlying parse failure.
        #[source]
        source: curing_expr::ParseError,
    },
    /// A calculation's formula failed to evaluate.
    #[error("calculation `{calculation_id}` formula failed to evaluate: {source}")]
    Evaluation {
        /// The calculation whose formula failed.
        calculation_id: String,
        /// Underlying evaluation failure.
        #[source]
        source: curing_expr::EvalError,
    },
}

/// Failures raised while detecting a run's `StageTimeline`.
#[derive(Debug, Error)]
pub enum StageError {
    /// A by-trigger-rule stage named a rule absent from the specification.
    #[error("stage `{stage_id}` references undefined trigger rule `{rule_id}`")]
    UnresolvedTriggerRule {
        /// The stage making the reference.
        stage_id: String,
        /// The missing rule's id.
        rule_id: String,
    },
    /// A by-time stage's range endpoint could not be interpreted under its
    /// declared unit.
    #[error("stage `{stage_id}` has an invalid time range: {detail}")]
    InvalidTimeRange {
        /// The stage with the malformed range.
        stage_id: String,
        /// What was wrong with it.
        detail: String,
    },
    /// A by-temperature-range or by-trigger-rule stage referenced an
    /// undefined sensor group.
    #[error("stage `{stage_id}` references undefined sensor group `{group}`")]
    UndefinedSensorGroup {
        /// The stage making the reference.
        stage_id: String,
        /// The missing group's name.
        group: String,
    },
    /// Reading a raw channel failed (missing timestamp channel, length
    /// mismatch, unparseable timestamp).
    #[error("stage `{stage_id}` could not read raw data: {source}")]
    RawData {
        /// The stage being detected.
        stage_id: String,
        /// Underlying raw-data failure.
        #[source]
        source: curing_core::model::RawDataError,
    },
    /// A by-trigger-rule stage's condition failed to parse or evaluate.
    #[error("stage `{stage_id}` trigger condition failed: {detail}")]
    TriggerCondition {
        /// The stage whose trigger condition failed.
        stage_id: String,
        /// What went wrong.
        detail: String,
    },
}
