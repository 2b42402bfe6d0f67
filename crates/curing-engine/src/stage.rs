// ============================================================================
// Module: Stage Detector
// Description: Resolves a specification's stage definitions into index
//              windows over the run's raw data.
// Purpose: Hand the rule evaluator a closed interval per stage without
//          re-running detection per rule.
// Dependencies: curing-core, curing-expr, time
// ============================================================================

//! ## Overview
//! Three detection modes share one downstream shape, `StageWindow`: fixed
//! time boundaries located by binary search, the first-true/first-false-
//! after-start window of a trigger rule's condition, and a temperature-range
//! convenience form evaluated the same way as a trigger rule. Stages are
//! resolved in declaration order so a stage whose end overruns the run can
//! clamp against the next stage's already-resolved start.

use curing_core::identifiers::RuleId;
use curing_core::identifiers::StageId;
use curing_core::model::BoundSpecification;
use curing_core::model::RuleDef;
use curing_core::model::SensorGrouping;
use curing_core::model::StageDetection;
use curing_core::model::StageFeatures;
use curing_core::model::StageTimeline;
use curing_core::model::StageWindow;
use curing_core::model::TimeRangeSpec;
use curing_core::model::TimeUnit;
use curing_core::model::RawData;
use curing_core::Value;
use curing_expr::evaluator::Environment;
use curing_expr::parse;
use curing_expr::TreeEvaluator;
use time::OffsetDateTime;

use crate::error::StageError;

/// Detects every stage in `specification.0.stages`, in declaration order,
/// returning the resolved `StageTimeline`.
///
/// `environment` is the calculation engine's output environment: trigger-
/// rule and temperature-range modes evaluate conditions against it, the
/// same way the rule evaluator eventually will.
///
/// # Errors
/// Returns [`StageError`] when a trigger rule is undefined, a sensor group
/// is undefined, a time range cannot be interpreted, or raw data cannot be
/// read.
pub fn detect_stages(
    specification: &BoundSpecification,
    raw: &RawData,
    grouping: &SensorGrouping,
    environment: &Environment,
) -> Result<StageTimeline, StageError> {
    let sample_count = raw.len().map_err(|source| StageError::RawData { stage_id: "*".to_string(), source })?;
    let timestamps = raw.timestamps().map_err(|source| StageError::RawData { stage_id: "*".to_string(), source })?;
    let sampling_interval = average_interval_minutes(&timestamps);

    let mut windows: Vec<(StageId, usize, usize, String)> = Vec::new();

    for (index, stage) in specification.as_specification().stages.iter().enumerate() {
        let Some(detection) = &stage.detection else {
            continue;
        };
        let (mut start, mut end, unit) = match detection {
            StageDetection::ByTime { range } => {
                let (start, end) = resolve_time_range(stage.id.as_str(), range, &timestamps)?;
                (start, end, format!("{:?}", range.unit).to_lowercase())
            }
            StageDetection::ByTriggerRule { rule_id } => {
                let condition = trigger_condition(specification, rule_id)
                    .ok_or_else(|| StageError::UnresolvedTriggerRule { stage_id: stage.id.as_str().to_string(), rule_id: rule_id.as_str().to_string() })?;
                let (start, end) = resolve_trigger_window(stage.id.as_str(), condition, environment, sample_count)?;
                (start, end, "index".to_string())
            }
            StageDetection::ByTemperatureRange { sensor_group, lower, upper, left_open, right_open } => {
                let (start, end) = resolve_temperature_range(stage.id.as_str(), sensor_group, *lower, *upper, *left_open, *right_open, raw, grouping)?;
                (start, end, "index".to_string())
            }
        };

        end = end.min(sample_count);
        if let Some(next_detection) = specification.as_specification().stages.get(index + 1).and_then(|next| next.detection.as_ref()) {
            if let StageDetection::ByTime { range } = next_detection {
                if let Ok((next_start, _)) = resolve_time_range("*", range, &timestamps) {
                    end = end.min(next_start.max(start));
                }
            }
        }
        if end <= start {
            tracing::warn!(stage = %stage.id, start, end, "stage window degenerate after clamping, expanding to one sample");
            end = start + 1;
        }
        start = start.min(sample_count);
        end = end.min(sample_count).max(start);

        windows.push((stage.id.clone(), start, end, unit));
    }

    let mut timeline = StageTimeline::new();
    for (stage_id, start, end, unit) in windows {
        let features = StageFeatures {
            #[allow(clippy::cast_precision_loss, reason = "stage sample counts fit f64 exactly at realistic run sizes")]
            duration_minutes: (end - start) as f64 * sampling_interval,
            data_points: end - start,
            unit,
            extra: std::collections::BTreeMap::new(),
        };
        timeline.insert(stage_id, StageWindow { start, end, features });
    }
    Ok(timeline)
}

fn average_interval_minutes(timestamps: &[OffsetDateTime]) -> f64 {
    if timestamps.len() < 2 {
        return 0.0;
    }
    let span = timestamps[timestamps.len() - 1] - timestamps[0];
    #[allow(clippy::cast_precision_loss, reason = "sample counts fit f64 exactly at realistic run sizes")]
    let steps = (timestamps.len() - 1) as f64;
    span.as_seconds_f64() / 60.0 / steps
}

fn resolve_time_range(stage_id: &str, range: &TimeRangeSpec, timestamps: &[OffsetDateTime]) -> Result<(usize, usize), StageError> {
    let start = time_boundary_index(stage_id, range.unit, &range.start, timestamps)?;
    let end = time_boundary_index(stage_id, range.unit, &range.end, timestamps)?;
    Ok((start, end))
}

fn time_boundary_index(stage_id: &str, unit: TimeUnit, text: &str, timestamps: &[OffsetDateTime]) -> Result<usize, StageError> {
    let boundary = match unit {
        TimeUnit::Datetime => OffsetDateTime::parse(text, &time::format_description::well_known::Rfc3339)
            .map_err(|error| StageError::InvalidTimeRange { stage_id: stage_id.to_string(), detail: error.to_string() })?,
        TimeUnit::UnixSeconds => {
            let seconds: i64 = text
                .parse()
                .map_err(|_| StageError::InvalidTimeRange { stage_id: stage_id.to_string(), detail: format!("`{text}` is not an integer") })?;
            OffsetDateTime::from_unix_timestamp(seconds)
                .map_err(|error| StageError::InvalidTimeRange { stage_id: stage_id.to_string(), detail: error.to_string() })?
        }
        TimeUnit::MinutesRelative => {
            let minutes: f64 = text
                .parse()
                .map_err(|_| StageError::InvalidTimeRange { stage_id: stage_id.to_string(), detail: format!("`{text}` is not a number") })?;
            let Some(&first) = timestamps.first() else {
                return Ok(0);
            };
            first + time::Duration::seconds_f64(minutes * 60.0)
        }
    };
    Ok(timestamps.partition_point(|timestamp| *timestamp < boundary).min(timestamps.len()))
}

fn trigger_condition<'a>(specification: &'a BoundSpecification, rule_id: &RuleId) -> Option<&'a str> {
    specification
        .as_specification()
        .rules
        .iter()
        .find(|rule: &&RuleDef| &rule.id == rule_id)
        .and_then(|rule| rule.condition.as_deref())
}

fn resolve_trigger_window(stage_id: &str, condition: &str, environment: &Environment, sample_count: usize) -> Result<(usize, usize), StageError> {
    let node =
        parse(condition).map_err(|error| StageError::TriggerCondition { stage_id: stage_id.to_string(), detail: error.to_string() })?;
    let evaluator = TreeEvaluator::new();
    let value = evaluator
        .evaluate(&node, environment)
        .map_err(|error| StageError::TriggerCondition { stage_id: stage_id.to_string(), detail: error.to_string() })?;
    Ok(first_true_then_first_false(&value, sample_count))
}

fn resolve_temperature_range(
    stage_id: &str,
    sensor_group: &str,
    lower: f64,
    upper: f64,
    left_open: bool,
    right_open: bool,
    raw: &RawData,
    grouping: &SensorGrouping,
) -> Result<(usize, usize), StageError> {
    let channels = grouping
        .group(sensor_group)
        .ok_or_else(|| StageError::UndefinedSensorGroup { stage_id: stage_id.to_string(), group: sensor_group.to_string() })?;
    let Some(channel) = channels.first() else {
        return Ok((0, 0));
    };
    let samples = raw
        .channels
        .get(channel)
        .ok_or_else(|| StageError::UndefinedSensorGroup { stage_id: stage_id.to_string(), group: sensor_group.to_string() })?;
    let flags: Vec<Value> = samples
        .iter()
        .map(|sample| {
            let reading = sample.as_f64().unwrap_or(f64::NAN);
            let above = if left_open { reading > lower } else { reading >= lower };
            let below = if right_open { reading < upper } else { reading <= upper };
            Value::Bool(above && below)
        })
        .collect();
    Ok(first_true_then_first_false(&Value::List(flags), samples.len()))
}

fn first_true_then_first_false(value: &Value, sample_count: usize) -> (usize, usize) {
    let Some(items) = value.as_list() else {
        return (0, sample_count);
    };
    let start = items.iter().position(Value::truthy).unwrap_or(0);
    let end = items.iter().skip(start + 1).position(|item| !item.truthy()).map_or(items.len(), |offset| start + 1 + offset);
    (start, end)
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

    use curing_core::identifiers::StageId;
    use curing_core::model::Sample;
    use curing_core::model::Specification;
    use curing_core::model::StageDef;

    use super::*;

    fn minute_series(count: usize) -> RawData {
        let timestamps = (0..count).map(|minute| Sample::Text(format!("2024-01-01T00:{minute:02}:00Z"))).collect();
        RawData { channels: BTreeMap::from([("ts".to_string(), timestamps)]), timestamp_channel: "ts".to_string() }
    }

    #[test]
    fn by_time_stage_resolves_to_expected_indices() {
        let raw = minute_series(60);
        let spec = BoundSpecification::new(Specification {
            id: None,
            rules: vec![],
            calculations: vec![],
            stages: vec![StageDef {
                id: StageId::new("heating"),
                template_id: None,
                detection: Some(StageDetection::ByTime {
                    range: TimeRangeSpec { unit: TimeUnit::Datetime, start: "2024-01-01T00:10:00Z".to_string(), end: "2024-01-01T00:40:00Z".to_string() },
                }),
                parameters: BTreeMap::new(),
            }],
        });
        let timeline = detect_stages(&spec, &raw, &SensorGrouping::new(), &Environment::new()).expect("detects stage");
        let window = timeline.window(&StageId::new("heating")).expect("stage present");
        assert_eq!((window.start, window.end), (10, 40));
    }

    #[test]
    fn by_temperature_range_finds_first_true_run() {
        let mut channels = BTreeMap::new();
        channels.insert("ts".to_string(), (0..5).map(|minute| Sample::Text(format!("2024-01-01T00:0{minute}:00Z"))).collect());
        channels.insert("ch_t1".to_string(), vec![10.0, 60.0, 62.0, 20.0, 15.0].into_iter().map(Sample::Number).collect());
        let raw = RawData { channels, timestamp_channel: "ts".to_string() };
        let mut grouping = SensorGrouping::new();
        grouping.0.insert("panel".to_string(), vec!["ch_t1".to_string()]);
        let spec = BoundSpecification::new(Specification {
            id: None,
            rules: vec![],
            calculations: vec![],
            stages: vec![StageDef {
                id: StageId::new("hold"),
                template_id: None,
                detection: Some(StageDetection::ByTemperatureRange {
                    sensor_group: "panel".to_string(),
                    lower: 55.0,
                    upper: 65.0,
                    left_open: false,
                    right_open: false,
                }),
                parameters: BTreeMap::new(),
            }],
        });
        let timeline = detect_stages(&spec, &raw, &grouping, &Environment::new()).expect("detects stage");
        let window = timeline.window(&StageId::new("hold")).expect("stage present");
        assert_eq!((window.start, window.end), (1, 3));
    }

    #[test]
    fn unresolved_trigger_rule_is_reported() {
        let raw = minute_series(5);
        let spec = BoundSpecification::new(Specification {
            id: None,
            rules: vec![],
            calculations: vec![],
            stages: vec![StageDef {
                id: StageId::new("hold"),
                template_id: None,
                detection: Some(StageDetection::ByTriggerRule { rule_id: curing_core::identifiers::RuleId::new("missing") }),
                parameters: BTreeMap::new(),
            }],
        });
        let result = detect_stages(&spec, &raw, &SensorGrouping::new(), &Environment::new());
        assert!(matches!(result, Err(StageError::UnresolvedTriggerRule { .. })));
    }
}
