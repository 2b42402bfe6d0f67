// ============================================================================
// Module: Series Operators
// Description: RATE and DURATION_SEGMENTS, the two operators that consume a
//              timestamp axis alongside their value list.
// Purpose: Isolate the only two operators with timing semantics from the
//          otherwise timestamp-free operator registry.
// Dependencies: time, curing-core
// ============================================================================

//! ## Overview
//! `RATE` computes a per-interval rate of change over a numeric series.
//! `DURATION_SEGMENTS` locates every contiguous run of `true` in a boolean
//! series and reports its extent. Both accept an optional timestamp axis;
//! without one, intervals are measured in sample steps rather than wall
//! time.

use curing_core::Value;
use time::OffsetDateTime;

use crate::error::EvalError;

/// Computes `RATE(values, step=1, timestamps=None)`: the per-interval
/// difference `values[i + step] - values[i]` divided by the elapsed time
/// (in minutes) between those two samples, or by `step` sample-steps when no
/// timestamp axis is supplied.
///
/// # Errors
/// Returns [`EvalError::TypeError`] if `step` is zero or exceeds the series
/// length, or [`EvalError::DivisionByZero`] if two samples used for a rate
/// share the same timestamp.
pub fn rate(values: &[f64], timestamps: Option<&[OffsetDateTime]>, step: usize) -> Result<Vec<f64>, EvalError> {
    if step == 0 {
        return Err(EvalError::TypeError {
            context: "RATE".to_string(),
            detail: "step must be at least 1".to_string(),
        });
    }
    if values.len() <= step {
        return Ok(Vec::new());
    }
    if let Some(timestamps) = timestamps {
        if timestamps.len() != values.len() {
            return Err(EvalError::ShapeMismatch {
                context: "RATE".to_string(),
                detail: format!("{} values but {} timestamps", values.len(), timestamps.len()),
            });
        }
    }

    (0 .. values.len() - step)
        .map(|index| {
            let delta_value = values[index + step] - values[index];
            let delta_minutes = timestamps.map_or(Ok(f64::from(u32::try_from(step).unwrap_or(u32::MAX))), |timestamps| {
                let elapsed = timestamps[index + step] - timestamps[index];
                let minutes = elapsed.as_seconds_f64() / 60.0;
                if minutes == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(minutes)
                }
            })?;
            Ok(delta_value / delta_minutes)
        })
        .collect()
}

/// One contiguous run of `true` in a boolean series.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Start index, inclusive.
    pub start: usize,
    /// End index, exclusive.
    pub end: usize,
    /// Duration covered by the segment, in minutes when timestamps were
    /// supplied, otherwise in sample steps.
    pub duration: f64,
}

impl Segment {
    /// Renders the segment the way the expression language's dynamic value
    /// represents structured records: a three-element list.
    #[must_use]
    pub fn to_value(&self) -> Value {
        #[allow(clippy::cast_precision_loss, reason = "segment indices are sample counts, far below f64's exact-integer range")]
        Value::List(vec![
            Value::Int(self.start as i64),
            Value::Int(self.end as i64),
            Value::Float(self.duration),
        ])
    }
}

/// Computes `DURATION_SEGMENTS(flags, timestamps=None)`: every maximal run
/// of `true` in `flags`.
#[must_use]
pub fn duration_segments(flags: &[bool], timestamps: Option<&[OffsetDateTime]>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut start = None;
    for (index, flag) in flags.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                segments.push(build_segment(begin, index, timestamps));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        segments.push(build_segment(begin, flags.len(), timestamps));
    }
    segments
}

fn build_segment(start: usize, end: usize, timestamps: Option<&[OffsetDateTime]>) -> Segment {
    #[allow(clippy::cast_precision_loss, reason = "segment lengths are sample counts, far below f64's exact-integer range")]
    let duration = timestamps.map_or((end - start) as f64, |timestamps| {
        let last = timestamps.get(end - 1);
        let first = timestamps.get(start);
        match (first, last) {
            (Some(&first), Some(&last)) => (last - first).as_seconds_f64() / 60.0,
            _ => (end - start) as f64,
        }
    });
    Segment { start, end, duration }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_without_timestamps_uses_step_as_interval() {
        let values = vec![0.0, 2.0, 4.0, 6.0];
        let rates = rate(&values, None, 1);
        assert_eq!(rates, Ok(vec![2.0, 2.0, 2.0]));
    }

    #[test]
    fn rate_rejects_zero_step() {
        assert!(rate(&[1.0, 2.0], None, 0).is_err());
    }

    #[test]
    fn rate_on_series_shorter_than_step_is_empty() {
        assert_eq!(rate(&[1.0], None, 2), Ok(Vec::new()));
    }

    #[test]
    fn duration_segments_finds_every_run_of_true() {
        let flags = vec![false, true, true, false, true];
        let segments = duration_segments(&flags, None);
        assert_eq!(
            segments,
            vec![
                Segment { start: 1, end: 3, duration: 2.0 },
                Segment { start: 4, end: 5, duration: 1.0 },
            ]
        );
    }

    #[test]
    fn duration_segments_closes_a_run_extending_to_the_end() {
        let flags = vec![true, true];
        let segments = duration_segments(&flags, None);
        assert_eq!(segments, vec![Segment { start: 0, end: 2, duration: 2.0 }]);
    }
}
