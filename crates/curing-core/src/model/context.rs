// ============================================================================
// Module: WorkflowContext
// Description: The shared, mutable run state passed through every task in a
//              DAG execution.
// Purpose: Give each task a single place to read upstream results and
//          publish its own, with single-writer discipline per key.
// Dependencies: serde, time
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::identifiers::TaskId;
use crate::model::param::ParamValue;
use crate::model::plan::ExecutionPlan;
use crate::model::raw_data::RawData;
use crate::model::stage_timeline::StageTimeline;
use crate::model::template::SensorGrouping;
use crate::value::Value;

/// The shared run state threaded through a single DAG execution.
///
/// # Invariants
/// - `is_initialized` flips to `true` exactly once, after source ingestion.
/// - Each task writes a disjoint set of keys: its own `processor_results`
///   entry, and at most the well-known fields it owns by convention
///   (`sensor_grouping` for grouping tasks, `stage_timeline` for the stage
///   detector, `execution_plan` for the plan builder, `formatted_results`
///   for the formatter). Writes replace a key's prior value wholesale; there
///   is no partial/merge write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowContext {
    /// The run's ingested sensor data, set once by the source task.
    pub raw_data: Option<RawData>,
    /// Free-form run metadata (request id, process id, upstream timing).
    #[serde(default)]
    pub metadata: BTreeMap<String, ParamValue>,
    /// The resolved sensor-group mapping for this run.
    pub sensor_grouping: Option<SensorGrouping>,
    /// The detected stage windows for this run.
    pub stage_timeline: Option<StageTimeline>,
    /// The plan currently executing.
    pub execution_plan: Option<ExecutionPlan>,
    /// Per-task results, keyed by task id.
    #[serde(default)]
    pub processor_results: BTreeMap<TaskId, Value>,
    /// The final formatted document, set by the formatter task.
    pub formatted_results: Option<Value>,
    /// Timestamp of the most recent write to this context.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    /// Whether source ingestion has completed.
    #[serde(default)]
    pub is_initialized: bool,
}

impl WorkflowContext {
    /// Creates an empty, uninitialized context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a task's result, replacing any prior value, and marks the
    /// context as touched at `now`.
    pub fn set_processor_result(&mut self, task: TaskId, value: Value, now: OffsetDateTime) {
        self.processor_results.insert(task, value);
        self.last_updated = Some(now);
    }

    /// Ingests the run's raw sensor data and flips `is_initialized`.
    pub fn initialize(&mut self, raw_data: RawData, now: OffsetDateTime) {
        self.raw_data = Some(raw_data);
        self.is_initialized = true;
        self.last_updated = Some(now);
    }

    /// Looks up a previously recorded task result.
    #[must_use]
    pub fn processor_result(&self, task: &TaskId) -> Option<&Value> {
        self.processor_results.get(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_sets_flag_and_timestamp() {
        let mut context = WorkflowContext::new();
        assert!(!context.is_initialized);
        context.initialize(RawData::default(), OffsetDateTime::UNIX_EPOCH);
        assert!(context.is_initialized);
        assert_eq!(context.last_updated, Some(OffsetDateTime::UNIX_EPOCH));
    }

    #[test]
    fn set_processor_result_replaces_prior_value() {
        let mut context = WorkflowContext::new();
        let task = TaskId::new("calc");
        context.set_processor_result(task.clone(), Value::Int(1), OffsetDateTime::UNIX_EPOCH);
        context.set_processor_result(task.clone(), Value::Int(2), OffsetDateTime::UNIX_EPOCH);
        assert_eq!(context.processor_result(&task), Some(&Value::Int(2)));
    }
}
