// ============================================================================
// Module: StageTimeline
// Description: The resolved index windows for every detected process stage.
// Purpose: Hand the rule evaluator a closed-interval slice per stage without
//          re-running detection.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::StageId;
use crate::model::param::ParamValue;

/// Advisory measurements attached to a detected stage window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageFeatures {
    /// `(end - start) * sampling_interval`, in minutes.
    pub duration_minutes: f64,
    /// `end - start`.
    pub data_points: usize,
    /// The configured time unit, echoed for downstream consumers.
    pub unit: String,
    /// Any additional advisory features a detector chose to attach.
    #[serde(default)]
    pub extra: BTreeMap<String, ParamValue>,
}

/// The half-open index interval `[start, end)` assigned to one stage, plus
/// the features computed over it.
///
/// # Invariants
/// - `end > start`.
/// - `start` and `end` lie within the run's sample bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageWindow {
    /// First sample index belonging to this stage, inclusive.
    pub start: usize,
    /// Last sample index belonging to this stage, exclusive.
    pub end: usize,
    /// Measurements computed over `[start, end)`.
    pub features: StageFeatures,
}

impl StageWindow {
    /// Number of samples in this window.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true when the window contains no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// `{stage_id -> resolved window}`, produced once per run by the stage
/// detector and consulted by the rule evaluator for environment slicing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageTimeline(
    /// Resolved window per stage id.
    pub BTreeMap<StageId, StageWindow>,
);

impl StageTimeline {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Looks up a stage's resolved window.
    #[must_use]
    pub fn window(&self, stage: &StageId) -> Option<&StageWindow> {
        self.0.get(stage)
    }

    /// Records a stage's resolved window, replacing any prior value.
    pub fn insert(&mut self, stage: StageId, window: StageWindow) {
        self.0.insert(stage, window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_len_is_half_open_extent() {
        let window = StageWindow {
            start: 10,
            end: 25,
            features: StageFeatures::default(),
        };
        assert_eq!(window.len(), 15);
        assert!(!window.is_empty());
    }

    #[test]
    fn degenerate_window_reports_empty() {
        let window = StageWindow {
            start: 5,
            end: 5,
            features: StageFeatures::default(),
        };
        assert!(window.is_empty());
    }

    #[test]
    fn timeline_insert_then_lookup_round_trips() {
        let mut timeline = StageTimeline::new();
        let stage = StageId::new("heating");
        timeline.insert(
            stage.clone(),
            StageWindow {
                start: 0,
                end: 10,
                features: StageFeatures::default(),
            },
        );
        assert_eq!(timeline.window(&stage).map(|window| window.start), Some(0));
    }
}
