// ============================================================================
// Module: Configuration Errors
// Description: Failures raised while loading templates/specifications and
//              while binding a specification to a run's sensor grouping.
// Purpose: Carry enough context (file path, missing id) to report without
//          re-reading the offending document.
// Dependencies: thiserror
// ============================================================================

//! Errors raised while loading and binding configuration documents.

use std::path::PathBuf;

use thiserror::Error;

use curing_core::model::TemplateKind;

/// Failures raised while loading templates or specifications from disk.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A filesystem operation failed while reading a configuration document.
    #[error("I/O error reading `{path}`: {source}")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A document's YAML failed to parse.
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        /// The path whose contents failed to parse.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// No directory or index entry resolves the requested specification id.
    #[error("specification `{id}` not found")]
    SpecNotFound {
        /// The requested specification id.
        id: String,
    },
    /// A template of the given kind and id is not present in the registry.
    #[error("{kind:?} template `{id}` not found")]
    TemplateNotFound {
        /// The template kind searched.
        kind: TemplateKind,
        /// The requested template id.
        id: String,
    },
}

/// Failures raised while binding a [`curing_core::model::Specification`]
/// against a run's [`curing_core::model::SensorGrouping`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A formula or condition referenced a sensor group absent from the
    /// supplied grouping.
    #[error("sensor group `{group}` not provided")]
    MissingSensorGroup {
        /// The missing group's name.
        group: String,
    },
    /// A rule, stage, or calculation entry referenced a template id absent
    /// from the template registry.
    #[error("template `{id}` not found")]
    UnresolvedTemplate {
        /// The missing template's id.
        id: String,
    },
    /// A rule's `calculation_id` does not name a calculation declared in the
    /// same specification.
    #[error("rule `{rule_id}` references unknown calculation `{calculation_id}`")]
    DanglingReference {
        /// The rule carrying the dangling reference.
        rule_id: String,
        /// The calculation id that does not resolve.
        calculation_id: String,
    },
}
