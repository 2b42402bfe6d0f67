// ============================================================================
// Module: Template
// Description: Reusable, sensor-agnostic definitions of calculations, rules,
//              and stage recognizers, as authored offline and loaded at
//              startup.
// Purpose: Give the configuration-binding layer one shape to merge with a
//          run's sensor grouping.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::TemplateId;
use crate::model::param::ParamValue;

/// The three kinds of template a process family may contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Produces a named intermediate value from sensor channels.
    Calculation,
    /// Evaluates a pass/fail condition.
    Rule,
    /// Locates a process stage within the run.
    Stage,
}

/// The sensor-agnostic payload of a template: a formula or condition for
/// calculation and rule templates, or nothing for stage templates (whose
/// detection shape lives on the specification's `StageDef`, since stage
/// recognizers are structured rather than textual).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateBody {
    /// A formula (for calculation templates) or condition (for rule
    /// templates), written in the expression language, with `{group}`
    /// placeholders for sensor groups not yet bound to physical channels.
    Formula(String),
    /// A stage template carries no formula; its detection shape is
    /// supplied per-use on the specification side.
    None,
}

/// A reusable definition not yet bound to physical sensors.
///
/// # Invariants
/// - `id` is unique within `kind` across a loaded registry (enforced by the
///   registry, not this type).
/// - Every `{name}` placeholder appearing in `body` also appears in `sensor_placeholders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Which of the three template kinds this is.
    pub kind: TemplateKind,
    /// Identifier, unique within `kind`.
    pub id: TemplateId,
    /// The formula or condition text, when applicable.
    #[serde(default)]
    pub body: TemplateBody,
    /// Names of sensor-group placeholders referenced by `body`.
    #[serde(default)]
    pub sensor_placeholders: Vec<String>,
    /// Default parameter values, overridable per use site.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl Default for TemplateBody {
    fn default() -> Self {
        Self::None
    }
}

/// Run-scoped mapping of group names to ordered lists of physical sensor
/// channel names, supplied alongside a run request.
///
/// # Invariants
/// - Every channel name named by a group resolves to a key in the run's
///   `RawData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorGrouping(
    /// Group name to ordered channel name list.
    pub BTreeMap<String, Vec<String>>,
);

impl SensorGrouping {
    /// Creates an empty grouping.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the channel list for a named group, if present.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Renders a group's channel list the way the runtime binder substitutes
    /// it into a `{group}` placeholder: the bare channel name when the group
    /// has exactly one channel, otherwise a parenthesised comma list.
    #[must_use]
    pub fn render_placeholder(&self, name: &str) -> Option<String> {
        let channels = self.group(name)?;
        match channels {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(format!("({})", many.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_channel_group_bare() {
        let mut grouping = SensorGrouping::new();
        grouping.0.insert("temp".to_string(), vec!["ch_t1".to_string()]);
        assert_eq!(grouping.render_placeholder("temp").as_deref(), Some("ch_t1"));
    }

    #[test]
    fn renders_multi_channel_group_as_parenthesised_list() {
        let mut grouping = SensorGrouping::new();
        grouping.0.insert(
            "temp".to_string(),
            vec!["ch_t1".to_string(), "ch_t2".to_string()],
        );
        assert_eq!(grouping.render_placeholder("temp").as_deref(), Some("(ch_t1, ch_t2)"));
    }

    #[test]
    fn missing_group_renders_to_none() {
        let grouping = SensorGrouping::new();
        assert_eq!(grouping.render_placeholder("missing"), None);
    }
}
