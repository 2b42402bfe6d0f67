// ============================================================================
// Module: Model
// Description: The entity types shared across the configuration-binding
//              layer, the expression engine, and the orchestrator.
// Purpose: One vocabulary of types every other crate in the workspace
//          depends on, with no behavior beyond what the entities themselves
//          require.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! This module holds data, not algorithms. Templates, specifications, raw
//! data, stage timelines, execution plans, the workflow context, and rule
//! results are all defined here so that `curing-config`, `curing-expr`,
//! `curing-engine`, `curing-orchestrator`, and `curing-adapters` can agree on
//! one shape without depending on each other.

mod context;
mod param;
mod plan;
mod raw_data;
mod result;
mod specification;
mod stage_timeline;
mod template;

pub use context::WorkflowContext;
pub use param::numeric_or;
pub use param::ParamValue;
pub use plan::ExecutionPlan;
pub use plan::TaskDef;
pub use raw_data::RawData;
pub use raw_data::RawDataError;
pub use raw_data::Sample;
pub use raw_data::TimeSeries;
pub use raw_data::TimeSeriesPoint;
pub use result::ComplianceReport;
pub use result::ResultAnalysis;
pub use result::RuleResult;
pub use result::Timing;
pub use specification::BoundSpecification;
pub use specification::CalculationDef;
pub use specification::CalculationType;
pub use specification::RuleDef;
pub use specification::Severity;
pub use specification::Specification;
pub use specification::StageDef;
pub use specification::StageDetection;
pub use specification::TimeRangeSpec;
pub use specification::TimeUnit;
pub use stage_timeline::StageFeatures;
pub use stage_timeline::StageTimeline;
pub use stage_timeline::StageWindow;
pub use template::SensorGrouping;
pub use template::Template;
pub use template::TemplateBody;
pub use template::TemplateKind;
