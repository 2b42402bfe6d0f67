// ============================================================================
// Module: Calculation Engine
// Description: Evaluates a bound specification's calculation definitions
//              into a `{id -> value}` map for the rule-evaluation
//              environment.
// Purpose: Turn raw sensor channels and a sensor grouping into the named
//          intermediate values rule conditions reference by id.
// Dependencies: curing-core, curing-expr
// ============================================================================

//! ## Overview
//! Two calculation shapes exist. A `sensor_group` entry is a direct zip of
//! physical channels against the timestamp axis — its own published value
//! *is* that zip. A `calculated` entry parses and evaluates a formula once
//! the physical channels behind each of its sensor groups are bound into the
//! environment as individual per-channel series.
//!
//! Every list-valued calculation also publishes `{id}_max`/`{id}_min`
//! companions, computed over the flattened numeric elements, or per-channel
//! (`{id}_{channel}_max`/`_min`) when the elements are themselves
//! per-channel lists.

use std::collections::BTreeMap;

use curing_core::identifiers::CalculationId;
use curing_core::model::BoundSpecification;
use curing_core::model::CalculationType;
use curing_core::model::RawData;
use curing_core::model::Sample;
use curing_core::model::SensorGrouping;
use curing_core::value::SeriesPoint;
use curing_core::Value;
use curing_expr::evaluator::Environment;
use curing_expr::parse;
use curing_expr::TreeEvaluator;

use crate::error::CalcError;

/// Evaluates every calculation in `specification.0.calculations`, in
/// declaration order, returning the `{id -> value}` map (including
/// `_max`/`_min` companions) to merge into the rule-evaluation environment.
///
/// # Errors
/// Returns [`CalcError`] on an undefined sensor group, a raw-data reading
/// failure, or a formula parse/evaluation failure. Any of these aborts the
/// whole run; calculations are not locally recoverable the way rule
/// conditions are.
pub fn evaluate_calculations(
    specification: &BoundSpecification,
    raw: &RawData,
    grouping: &SensorGrouping,
) -> Result<BTreeMap<String, Value>, CalcError> {
    let mut environment = Environment::new();
    let evaluator = TreeEvaluator::new();

    for calculation in &specification.as_specification().calculations {
        let id = calculation.id.as_str();
        let value = match calculation.calc_type {
            CalculationType::SensorGroup => zip_channels(raw, &calculation.sensors).map_err(|source| CalcError::RawData {
                calculation_id: id.to_string(),
                source,
            })?,
            CalculationType::Calculated => {
                bind_group_channels(&mut environment, raw, grouping, &calculation.id, &calculation.sensors)?;
                let formula = calculation.formula.as_deref().unwrap_or_default();
                let node = parse(formula).map_err(|source| CalcError::Parse { calculation_id: id.to_string(), source })?;
                evaluator
                    .evaluate_cached(&node, &environment, None)
                    .map_err(|source| CalcError::Evaluation { calculation_id: id.to_string(), source })?
            }
        };

        environment.insert(id.to_string(), value.clone());
        publish_companions(&mut environment, id, &value);
    }

    Ok(environment)
}

fn bind_group_channels(
    environment: &mut Environment,
    raw: &RawData,
    grouping: &SensorGrouping,
    calculation_id: &CalculationId,
    groups: &[String],
) -> Result<(), CalcError> {
    for group in groups {
        let channels = grouping
            .group(group)
            .ok_or_else(|| CalcError::UndefinedSensorGroup { calculation_id: calculation_id.as_str().to_string(), group: group.clone() })?;
        for channel in channels {
            if environment.contains_key(channel) {
                continue;
            }
            let series = zip_channels(raw, std::slice::from_ref(channel)).map_err(|source| CalcError::RawData {
                calculation_id: calculation_id.as_str().to_string(),
                source,
            })?;
            environment.insert(channel.clone(), series);
        }
    }
    Ok(())
}

/// Zips `channels` against the run's timestamp axis into one `Value::Series`.
/// A single channel yields a scalar value per sample; more than one yields a
/// `Value::List` per sample, in `channels` order.
fn zip_channels(raw: &RawData, channels: &[String]) -> Result<Value, curing_core::model::RawDataError> {
    let timestamps = raw.timestamps()?;
    let columns: Vec<&[Sample]> = channels
        .iter()
        .map(|channel| raw.channels.get(channel).map(Vec::as_slice).unwrap_or(&[]))
        .collect();

    let points = timestamps
        .into_iter()
        .enumerate()
        .map(|(index, timestamp)| {
            let value = if columns.len() == 1 {
                sample_value(columns[0].get(index))
            } else {
                Value::List(columns.iter().map(|column| sample_value(column.get(index))).collect())
            };
            SeriesPoint { timestamp, value: Box::new(value) }
        })
        .collect();

    Ok(Value::Series(points))
}

fn sample_value(sample: Option<&Sample>) -> Value {
    match sample {
        Some(Sample::Number(number)) => Value::Float(*number),
        Some(Sample::Text(text)) => Value::Str(text.clone()),
        None => Value::Null,
    }
}

/// Publishes `{id}_max`/`{id}_min` over a list-valued calculation's
/// flattened numeric elements.
///
/// Spec language distinguishes a flattened-scalar form from a per-channel
/// form for "dict"-shaped samples; this engine's `Value` has no map/dict
/// variant (a deliberate closed set — see `DESIGN.md`), so every multi-
/// channel sample is itself a `Value::List` and the flattened form always
/// applies.
fn publish_companions(environment: &mut Environment, id: &str, value: &Value) {
    let Value::Series(points) = value else { return };
    if points.is_empty() {
        return;
    }

    let flattened: Vec<f64> = points.iter().flat_map(|point| numeric_leaves(&point.value)).collect();
    if !flattened.is_empty() {
        publish_min_max(environment, id, &flattened);
    }
}

fn numeric_leaves(value: &Value) -> Vec<f64> {
    match value {
        Value::List(items) => items.iter().flat_map(numeric_leaves).collect(),
        other => other.as_f64().into_iter().collect(),
    }
}

fn publish_min_max(environment: &mut Environment, prefix: &str, values: &[f64]) {
    let Some(max) = values.iter().copied().fold(None, |acc: Option<f64>, value| Some(acc.map_or(value, |current| current.max(value)))) else {
        return;
    };
    let min = values.iter().copied().fold(max, f64::min);
    environment.insert(format!("{prefix}_max"), Value::Float(max));
    environment.insert(format!("{prefix}_min"), Value::Float(min));
}
