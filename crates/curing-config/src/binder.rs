// ============================================================================
// Module: Runtime Binder
// Description: Resolves a specification's templates and `{placeholder}`
//              references against one run's sensor grouping.
// Purpose: Produce a `BoundSpecification` the expression engine and
//          orchestrator can evaluate with no further lookups.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! Binding happens in three passes, in order: calculations, then rules,
//! then stages. Rules come after calculations because a rule's condition
//! may need to know which calculation id it refers to; stages come last
//! because a `ByTriggerRule` detector names a rule id.
//!
//! Severity and stage assignment are properties of how a specification
//! *uses* a rule, not of the rule template itself, so rule templates
//! contribute only condition text and default parameters; template-level
//! severity or stage hints (if a document supplies them) are expected to
//! arrive as ordinary default parameters rather than as typed template
//! fields.

use std::collections::BTreeMap;

use curing_core::model::BoundSpecification;
use curing_core::model::CalculationDef;
use curing_core::model::ParamValue;
use curing_core::model::RuleDef;
use curing_core::model::SensorGrouping;
use curing_core::model::Specification;
use curing_core::model::StageDef;
use curing_core::model::Template;
use curing_core::model::TemplateBody;
use curing_core::model::TemplateKind;

use crate::error::BindError;
use crate::registry::TemplateRegistry;

/// Resolves every template reference and `{placeholder}` in `specification`
/// against `grouping`, producing a specification safe to evaluate.
///
/// # Errors
/// - [`BindError::UnresolvedTemplate`] when a `template_id` names a
///   template absent from `templates`.
/// - [`BindError::MissingSensorGroup`] when a formula or condition
///   references a sensor group absent from `grouping`.
/// - [`BindError::DanglingReference`] when a rule's resolved
///   `calculation_id` does not name a calculation in the same
///   specification.
pub fn bind(specification: &Specification, grouping: &SensorGrouping, templates: &TemplateRegistry) -> Result<BoundSpecification, BindError> {
    let calculations =
        specification.calculations.iter().map(|calculation| bind_calculation(calculation, grouping, templates)).collect::<Result<Vec<_>, _>>()?;

    let known_calculations: std::collections::BTreeSet<&str> = calculations.iter().map(|calculation| calculation.id.as_str()).collect();

    let rules = specification
        .rules
        .iter()
        .map(|rule| bind_rule(rule, grouping, templates, &known_calculations))
        .collect::<Result<Vec<_>, _>>()?;

    let stages = specification.stages.iter().map(|stage| bind_stage(stage, templates)).collect::<Result<Vec<_>, _>>()?;

    Ok(BoundSpecification::new(Specification { id: specification.id.clone(), rules, stages, calculations }))
}

fn resolve_template<'a>(
    templates: &'a TemplateRegistry,
    kind: TemplateKind,
    template_id: &curing_core::identifiers::TemplateId,
) -> Result<&'a Template, BindError> {
    templates.get_template(kind, template_id).ok_or_else(|| BindError::UnresolvedTemplate { id: template_id.as_str().to_string() })
}

fn substitute_groups(text: &str, groups: &[String], grouping: &SensorGrouping) -> Result<String, BindError> {
    let mut rendered = text.to_string();
    for group in groups {
        let placeholder = format!("{{{group}}}");
        if !rendered.contains(&placeholder) {
            continue;
        }
        let channels = grouping.render_placeholder(group).ok_or_else(|| BindError::MissingSensorGroup { group: group.clone() })?;
        rendered = rendered.replace(&placeholder, &channels);
    }
    Ok(rendered)
}

fn merge_parameters(
    defaults: &BTreeMap<String, ParamValue>,
    overrides: &BTreeMap<String, ParamValue>,
) -> BTreeMap<String, ParamValue> {
    let mut merged = defaults.clone();
    merged.extend(overrides.clone());
    merged
}

fn bind_calculation(calculation: &CalculationDef, grouping: &SensorGrouping, templates: &TemplateRegistry) -> Result<CalculationDef, BindError> {
    let template = calculation.template_id.as_ref().map(|id| resolve_template(templates, TemplateKind::Calculation, id)).transpose()?;

    let base_formula = template
        .and_then(|template| match &template.body {
            TemplateBody::Formula(text) => Some(text.clone()),
            TemplateBody::None => None,
        })
        .or_else(|| calculation.formula.clone());

    let formula = base_formula.map(|text| substitute_groups(&text, &calculation.sensors, grouping)).transpose()?;

    let parameters = match template {
        Some(template) => merge_parameters(&template.parameters, &calculation.parameters),
        None => calculation.parameters.clone(),
    };

    Ok(CalculationDef {
        id: calculation.id.clone(),
        template_id: None,
        formula,
        calc_type: calculation.calc_type,
        sensors: calculation.sensors.clone(),
        parameters,
    })
}

fn bind_rule(
    rule: &RuleDef,
    _grouping: &SensorGrouping,
    templates: &TemplateRegistry,
    known_calculations: &std::collections::BTreeSet<&str>,
) -> Result<RuleDef, BindError> {
    let template = rule.template_id.as_ref().map(|id| resolve_template(templates, TemplateKind::Rule, id)).transpose()?;

    let base_condition = template
        .and_then(|template| match &template.body {
            TemplateBody::Formula(text) => Some(text.clone()),
            TemplateBody::None => None,
        })
        .or_else(|| rule.condition.clone());

    let parameters = match template {
        Some(template) => merge_parameters(&template.parameters, &rule.parameters),
        None => rule.parameters.clone(),
    };

    let calculation_id = parameters
        .get("calculation_id")
        .and_then(ParamValue::as_str)
        .map(curing_core::identifiers::CalculationId::new)
        .or_else(|| rule.calculation_id.clone());

    if let Some(calculation_id) = &calculation_id {
        if !known_calculations.contains(calculation_id.as_str()) {
            return Err(BindError::DanglingReference { rule_id: rule.id.as_str().to_string(), calculation_id: calculation_id.as_str().to_string() });
        }
    }

    let condition = base_condition
        .map(|text| {
            let text = match &calculation_id {
                Some(calculation_id) => text.replace("{calculation_id}", calculation_id.as_str()),
                None => text,
            };
            substitute_groups_in_params(&text, &parameters)
        })
        .transpose()?;

    Ok(RuleDef {
        id: rule.id.clone(),
        template_id: None,
        condition,
        calculation_id,
        stage: rule.stage.clone(),
        severity: rule.severity,
        parameters,
    })
}

/// Substitutes `{name}` placeholders in `text` with scalar parameter values,
/// leaving unmatched placeholders untouched (they may be sensor-group
/// placeholders handled elsewhere, or genuinely unresolved).
fn substitute_groups_in_params(text: &str, parameters: &BTreeMap<String, ParamValue>) -> Result<String, BindError> {
    let mut rendered = text.to_string();
    for (key, value) in parameters {
        let placeholder = format!("{{{key}}}");
        if !rendered.contains(&placeholder) {
            continue;
        }
        if let Some(rendered_value) = render_param(value) {
            rendered = rendered.replace(&placeholder, &rendered_value);
        }
    }
    Ok(rendered)
}

fn render_param(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::Null => None,
        ParamValue::Bool(flag) => Some(flag.to_string()),
        ParamValue::Int(number) => Some(number.to_string()),
        ParamValue::Float(number) => Some(number.to_string()),
        ParamValue::Str(text) => Some(text.clone()),
        ParamValue::List(_) => None,
    }
}

fn bind_stage(stage: &StageDef, templates: &TemplateRegistry) -> Result<StageDef, BindError> {
    let template = stage.template_id.as_ref().map(|id| resolve_template(templates, TemplateKind::Stage, id)).transpose()?;

    let parameters = match template {
        Some(template) => merge_parameters(&template.parameters, &stage.parameters),
        None => stage.parameters.clone(),
    };

    Ok(StageDef { id: stage.id.clone(), template_id: None, detection: stage.detection.clone(), parameters })
}
