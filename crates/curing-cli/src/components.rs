// ============================================================================
// Module: Workflow Components
// Description: Adapts `curing-engine`'s pipeline functions and
//              `curing-adapters`' `Source` trait into `curing-orchestrator`'s
//              `Component` trait.
// Purpose: Compose the library crates into one runnable DAG without any of
//          them depending on each other directly — this crate is the only
//          place that knows about all three.
// Dependencies: curing-core, curing-engine, curing-adapters, curing-orchestrator, time
// ============================================================================

//! ## Overview
//! `WorkflowContext` carries a per-task `Value` result map but `Value` has
//! no map/object variant, so a task that needs to hand a whole environment
//! to its successor (every calculation, keyed by id) writes one
//! `processor_results` entry per calculation rather than one entry for
//! itself. Downstream components rebuild an `Environment` from those
//! entries via [`rebuild_environment`]. Stage detection keeps its own
//! dedicated `stage_timeline` field, so it does not need this workaround;
//! the formatted document is assembled and stored as a serialized JSON
//! string in `formatted_results`, for the same map-less-`Value` reason.

use std::sync::Arc;

use curing_core::identifiers::TaskId;
use curing_core::model::BoundSpecification;
use curing_core::model::SensorGrouping;
use curing_core::model::TaskDef;
use curing_core::model::Timing;
use curing_core::model::WorkflowContext;
use curing_core::value::Value;
use curing_engine::format::now_iso8601;
use time::OffsetDateTime;

use curing_adapters::Source;
use curing_orchestrator::Component;

/// Layer name for the ingestion task.
pub const LAYER_SOURCE: &str = "source";
/// Layer name for the sensor-grouping task.
pub const LAYER_GROUPING: &str = "grouping";
/// Layer name for the calculation task.
pub const LAYER_CALCULATION: &str = "calculation";
/// Layer name for the stage detection task.
pub const LAYER_STAGE: &str = "stage";
/// Layer name for the combined rule evaluation and formatting task.
pub const LAYER_ANALYSIS: &str = "analysis";

fn rebuild_environment(context: &WorkflowContext) -> curing_expr::Environment {
    context.processor_results.iter().map(|(id, value)| (id.as_str().to_string(), value.clone())).collect()
}

/// Ingests one run's sensor data through a configured [`Source`].
pub struct IngestComponent {
    source: Arc<dyn Source + Send + Sync>,
}

impl IngestComponent {
    /// Wraps `source` as a DAG task.
    #[must_use]
    pub const fn new(source: Arc<dyn Source + Send + Sync>) -> Self {
        Self { source }
    }
}

impl Component for IngestComponent {
    fn run(&self, _task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
        let payload = self.source.read().map_err(|error| error.to_string())?;
        context.metadata.insert("row_count".to_string(), curing_core::model::ParamValue::Int(i64::try_from(payload.metadata.row_count).unwrap_or(i64::MAX)));
        context.metadata.insert("column_count".to_string(), curing_core::model::ParamValue::Int(i64::try_from(payload.metadata.column_count).unwrap_or(i64::MAX)));
        context.initialize(payload.data, OffsetDateTime::now_utc());
        Ok(())
    }
}

/// Publishes a run's fixed sensor-group mapping into the context.
pub struct GroupingComponent {
    grouping: SensorGrouping,
}

impl GroupingComponent {
    /// Wraps `grouping` as a DAG task.
    #[must_use]
    pub const fn new(grouping: SensorGrouping) -> Self {
        Self { grouping }
    }
}

impl Component for GroupingComponent {
    fn run(&self, _task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
        context.sensor_grouping = Some(self.grouping.clone());
        Ok(())
    }
}

/// Evaluates every declared calculation into the rule-evaluation
/// environment.
pub struct CalculationComponent {
    specification: Arc<BoundSpecification>,
}

impl CalculationComponent {
    /// Wraps `specification` as a DAG task.
    #[must_use]
    pub const fn new(specification: Arc<BoundSpecification>) -> Self {
        Self { specification }
    }
}

impl Component for CalculationComponent {
    fn run(&self, _task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
        let raw = context.raw_data.clone().ok_or("calculation task ran before source ingestion")?;
        let grouping = context.sensor_grouping.clone().ok_or("calculation task ran before sensor grouping was published")?;
        let environment = curing_engine::evaluate_calculations(&self.specification, &raw, &grouping).map_err(|error| error.to_string())?;
        for (name, value) in environment {
            context.processor_results.insert(TaskId::new(name), value);
        }
        Ok(())
    }
}

/// Detects every declared stage window over the run.
pub struct StageComponent {
    specification: Arc<BoundSpecification>,
}

impl StageComponent {
    /// Wraps `specification` as a DAG task.
    #[must_use]
    pub const fn new(specification: Arc<BoundSpecification>) -> Self {
        Self { specification }
    }
}

impl Component for StageComponent {
    fn run(&self, _task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
        let raw = context.raw_data.clone().ok_or("stage task ran before source ingestion")?;
        let grouping = context.sensor_grouping.clone().ok_or("stage task ran before sensor grouping was published")?;
        let environment = rebuild_environment(context);
        let timeline = curing_engine::detect_stages(&self.specification, &raw, &grouping, &environment).map_err(|error| error.to_string())?;
        context.stage_timeline = Some(timeline);
        Ok(())
    }
}

/// Evaluates every rule against its stage window and formats the result.
pub struct AnalysisComponent {
    specification: Arc<BoundSpecification>,
    rule_id_prefixes: Vec<String>,
    algorithm: String,
    generated_by: String,
    request_time: OffsetDateTime,
}

impl AnalysisComponent {
    /// Wraps `specification` and formatting metadata as a DAG task.
    #[must_use]
    pub fn new(specification: Arc<BoundSpecification>, rule_id_prefixes: Vec<String>, algorithm: String, generated_by: String, request_time: OffsetDateTime) -> Self {
        Self { specification, rule_id_prefixes, algorithm, generated_by, request_time }
    }
}

impl Component for AnalysisComponent {
    fn run(&self, _task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
        let timeline = context.stage_timeline.clone().ok_or("analysis task ran before stage detection")?;
        let environment = rebuild_environment(context);
        let execution_time = OffsetDateTime::now_utc();
        let rules = curing_engine::evaluate_rules(&self.specification, &environment, &timeline, execution_time);
        let timing = Timing {
            request_time: now_iso8601(self.request_time),
            execution_time: now_iso8601(execution_time),
            generation_time: now_iso8601(execution_time),
        };
        let report = curing_core::model::ComplianceReport::from_rules(rules, timing);
        let document = curing_engine::format_standard(&report, &self.rule_id_prefixes, &self.algorithm, &self.generated_by);
        let serialized = serde_json::to_string(&document).map_err(|error| error.to_string())?;
        context.formatted_results = Some(Value::Str(serialized));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, reason = "Test fixtures use explicit asserts and unwraps for clarity.")]

    use std::collections::BTreeMap;

    use curing_core::identifiers::CalculationId;
    use curing_core::identifiers::RuleId;
    use curing_core::model::CalculationDef;
    use curing_core::model::RawData;
    use curing_core::model::Sample;
    use curing_core::model::CalculationType;
    use curing_core::model::Specification;

    use super::*;
    use curing_adapters::SourceError;
    use curing_adapters::SourceMetadata;
    use curing_adapters::SourcePayload;
    use curing_core::model::RuleDef;

    struct Fixed(RawData);
    impl curing_adapters::Source for Fixed {
        fn read(&self) -> Result<SourcePayload, SourceError> {
            Ok(SourcePayload {
                data: self.0.clone(),
                metadata: SourceMetadata { row_count: 3, column_count: 2, columns: vec!["ts".to_string(), "temperature".to_string()], timestamp_column: "ts".to_string() },
            })
        }
    }

    fn raw() -> RawData {
        let mut channels = BTreeMap::new();
        channels.insert(
            "ts".to_string(),
            vec![Sample::Text("2026-01-01T00:00:00Z".to_string()), Sample::Text("2026-01-01T00:01:00Z".to_string()), Sample::Text("2026-01-01T00:02:00Z".to_string())],
        );
        channels.insert("temperature".to_string(), vec![Sample::Number(20.0), Sample::Number(21.0), Sample::Number(22.0)]);
        RawData { channels, timestamp_channel: "ts".to_string() }
    }

    fn specification() -> BoundSpecification {
        BoundSpecification::new(Specification {
            id: None,
            rules: vec![RuleDef {
                id: RuleId::new("peak-temp"),
                template_id: None,
                condition: Some("peak_temperature_max > 15".to_string()),
                calculation_id: Some(CalculationId::new("peak_temperature")),
                stage: curing_core::identifiers::StageId::new(curing_core::identifiers::GLOBAL_STAGE),
                severity: curing_core::model::Severity::Major,
                parameters: BTreeMap::new(),
            }],
            stages: vec![],
            calculations: vec![CalculationDef {
                id: CalculationId::new("peak_temperature"),
                template_id: None,
                formula: None,
                calc_type: CalculationType::SensorGroup,
                sensors: vec!["temperature".to_string()],
                parameters: BTreeMap::new(),
            }],
        })
    }

    #[test]
    fn full_pipeline_produces_a_passing_formatted_document() {
        let specification = Arc::new(specification());
        let mut context = WorkflowContext::new();
        let task = TaskDef { id: TaskId::new("t"), layer: String::new(), implementation: String::new(), algorithm: None, depends_on: vec![], parameters: BTreeMap::new() };

        IngestComponent::new(Arc::new(Fixed(raw()))).run(&task, &mut context).expect("ingest");
        GroupingComponent::new(SensorGrouping::new()).run(&task, &mut context).expect("grouping");
        CalculationComponent::new(Arc::clone(&specification)).run(&task, &mut context).expect("calculation");
        StageComponent::new(Arc::clone(&specification)).run(&task, &mut context).expect("stage");
        AnalysisComponent::new(specification, vec!["peak".to_string()], "standard".to_string(), "test".to_string(), OffsetDateTime::now_utc()).run(&task, &mut context).expect("analysis");

        let Some(Value::Str(document)) = context.formatted_results else { panic!("expected a serialized document") };
        assert!(document.contains("\"status\":\"pass\""));
    }
}
