// crates/curing-engine/src/lib.rs
// ============================================================================
// Module: Curing Engine
// Description: Calculation evaluation, stage detection, rule evaluation, and
//              result formatting for one analytics run.
// Purpose: Turn a bound specification and a run's raw sensor data into a
//          formatted compliance document, with no knowledge of how the run
//          was scheduled or where its data came from.
// Dependencies: curing-core, curing-expr, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! The four modules here run in a fixed pipeline: [`calculation`] resolves
//! every declared calculation into the rule-evaluation environment,
//! [`stage`] resolves every declared stage into index windows over the run,
//! [`rule`] evaluates every rule against its assigned stage window, and
//! [`format`] aggregates the resulting `RuleResult`s into the standard-form
//! document. `curing-orchestrator` drives this pipeline as one DAG task per
//! module; nothing in this crate knows about tasks, workflows, or adapters.

pub mod calculation;
pub mod error;
pub mod format;
pub mod rule;
pub mod stage;

pub use calculation::evaluate_calculations;
pub use error::CalcError;
pub use error::StageError;
pub use format::format_standard;
pub use format::FormattedDocument;
pub use rule::evaluate_rules;
pub use stage::detect_stages;
