// ============================================================================
// Module: Specification
// Description: A named bundle of stages, rules, and calculations, in both
//              its unbound (template-referencing) and bound (placeholder-
//              free) forms.
// Purpose: Carry the shape the binder reads and the shape it produces,
//          distinguished at the type level so a caller cannot accidentally
//          evaluate an unbound specification.
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::CalculationId;
use crate::identifiers::RuleId;
use crate::identifiers::SpecificationId;
use crate::identifiers::StageId;
use crate::identifiers::TemplateId;
use crate::identifiers::GLOBAL_STAGE;
use crate::model::param::ParamValue;

/// How strongly a failed rule should be weighted by downstream consumers.
///
/// No ordering is imposed by this engine; severities are opaque labels
/// carried through to the compliance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Run-stopping defect.
    Critical,
    /// Significant defect, run continues.
    Major,
    /// Minor deviation.
    Minor,
    /// Informational only.
    Info,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Major
    }
}

/// A calculation's data-flow shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    /// A direct zip of raw sensor channels against the timestamp axis.
    SensorGroup,
    /// A formula evaluated over already-bound sensor groups.
    Calculated,
}

/// A unit used to interpret a by-time stage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// RFC 3339 datetime strings.
    Datetime,
    /// Unix timestamp, whole seconds.
    UnixSeconds,
    /// Minutes relative to the run's first timestamp.
    MinutesRelative,
}

/// The inclusive start/end boundary of a by-time stage, in `unit`'s terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRangeSpec {
    /// How `start`/`end` are to be interpreted.
    pub unit: TimeUnit,
    /// Range start, encoded per `unit`.
    pub start: String,
    /// Range end, encoded per `unit`.
    pub end: String,
}

/// How a stage's index window is located within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StageDetection {
    /// Fixed time boundaries converted to indices by binary search.
    ByTime {
        /// The boundary specification.
        range: TimeRangeSpec,
    },
    /// The first-true/first-false-after-start window of a rule's condition.
    ByTriggerRule {
        /// The rule whose condition delimits the stage.
        rule_id: RuleId,
    },
    /// A convenience form equivalent to an internal `IN_RANGE` comparison.
    ByTemperatureRange {
        /// Sensor group the range applies to.
        sensor_group: String,
        /// Inclusive (unless `left_open`) lower bound.
        lower: f64,
        /// Inclusive (unless `right_open`) upper bound.
        upper: f64,
        /// Whether `lower` itself is excluded.
        #[serde(default)]
        left_open: bool,
        /// Whether `upper` itself is excluded.
        #[serde(default)]
        right_open: bool,
    },
}

/// One rule entry within a specification: a reference to a template (or an
/// inline condition), parameter overrides, and a stage assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDef {
    /// Identifier, unique within the specification.
    pub id: RuleId,
    /// Template supplying the condition text, if any.
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Condition text, when not sourced from a template.
    #[serde(default)]
    pub condition: Option<String>,
    /// Calculation this rule's condition is expected to reference.
    #[serde(default)]
    pub calculation_id: Option<CalculationId>,
    /// Stage this rule applies to; the sentinel `global` means the whole run.
    #[serde(default = "RuleDef::default_stage")]
    pub stage: StageId,
    /// Severity recorded on failure.
    #[serde(default)]
    pub severity: Severity,
    /// Parameter overrides merged over the template's defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl RuleDef {
    fn default_stage() -> StageId {
        StageId::new(GLOBAL_STAGE)
    }
}

/// One stage entry within a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
    /// Identifier, unique within the specification.
    pub id: StageId,
    /// Template supplying the detection shape, if any.
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Detection shape, when not sourced from a template.
    #[serde(default)]
    pub detection: Option<StageDetection>,
    /// Parameter overrides merged over the template's defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// One calculation entry within a specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDef {
    /// Identifier, unique within the specification.
    pub id: CalculationId,
    /// Template supplying the formula, for `calculated` entries.
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Formula text, when not sourced from a template.
    #[serde(default)]
    pub formula: Option<String>,
    /// Which data-flow shape this entry has.
    pub calc_type: CalculationType,
    /// Sensor-group placeholder names this calculation consumes.
    #[serde(default)]
    pub sensors: Vec<String>,
    /// Parameter overrides merged over the template's defaults.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// A named bundle of stages, rules, and calculations, as loaded from the
/// specification registry, still containing `{placeholder}` references.
///
/// # Invariants
/// - Each rule's `stage` references an existing stage id or `global`.
/// - Each rule's `calculation_id`, when present, references an existing
///   calculation in the same specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Specification {
    /// Identifier of this specification.
    pub id: Option<SpecificationId>,
    /// Rule entries, evaluated in declaration order.
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    /// Stage entries.
    #[serde(default)]
    pub stages: Vec<StageDef>,
    /// Calculation entries.
    #[serde(default)]
    pub calculations: Vec<CalculationDef>,
}

/// A [`Specification`] with every `{placeholder}` resolved to concrete
/// sensor channel names.
///
/// Carries the same shape as `Specification`; the newtype wrapper exists so
/// the type system distinguishes "safe to evaluate" from "still templated"
/// at call sites (the runtime binder is the only producer of this type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundSpecification(
    /// The resolved specification, placeholder-free.
    pub Specification,
);

impl BoundSpecification {
    /// Wraps an already-resolved specification.
    ///
    /// Callers outside `curing-config::binder` should not construct this
    /// directly; it exists publicly so the binder's own crate can build one.
    #[must_use]
    pub const fn new(resolved: Specification) -> Self {
        Self(resolved)
    }

    /// Borrows the resolved specification.
    #[must_use]
    pub const fn as_specification(&self) -> &Specification {
        &self.0
    }
}
