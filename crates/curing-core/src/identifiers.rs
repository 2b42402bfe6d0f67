// ============================================================================
// Module: Identifiers
// Description: Canonical opaque identifiers used throughout the engine.
// Purpose: Provide strongly typed, serializable ids with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every entity that crosses a component boundary (a template, a
//! specification, a rule, a stage, a calculation, a task) is named by a
//! small `String`-backed newtype rather than a bare `String`, so that a
//! `TemplateId` and a `RuleId` cannot be swapped by mistake at a call site.
//! Validation of the underlying text is left to the producer; these types
//! are deliberately thin.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Declares a `String`-backed identifier newtype with the standard
/// constructor, accessor, `Display`, and `From` conversions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifies a template within one [`TemplateKind`](crate::model::TemplateKind).
    TemplateId
);
string_id!(
    /// Identifies a specification (a named bundle of rules, stages, calculations).
    SpecificationId
);
string_id!(
    /// Identifies a rule within a specification.
    RuleId
);
string_id!(
    /// Identifies a stage within a specification.
    StageId
);
string_id!(
    /// Identifies a calculation within a specification.
    CalculationId
);
string_id!(
    /// Identifies a task within an [`ExecutionPlan`](crate::model::ExecutionPlan).
    TaskId
);
string_id!(
    /// Identifies a workflow definition driving the orchestrator.
    WorkflowId
);
string_id!(
    /// Identifies a sensor channel within [`RawData`](crate::model::RawData).
    ChannelId
);

/// Sentinel stage id meaning "applies across the whole run, not one stage".
pub const GLOBAL_STAGE: &str = "global";

/// Returns true when a stage identifier is the global sentinel.
#[must_use]
pub fn is_global_stage(id: &StageId) -> bool {
    id.as_str() == GLOBAL_STAGE
}
