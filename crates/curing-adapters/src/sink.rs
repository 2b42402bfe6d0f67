// ============================================================================
// Module: Sink Contract
// Description: The adapter-facing contract every delivery implementation
//              satisfies, plus path-template substitution shared by all of
//              them.
// Purpose: Let the orchestrator depend on one trait regardless of delivery
//          mechanism, and keep `{process_id}`/`{series_id}`/
//          `{calculation_date}` substitution in one place rather than
//          reimplemented per sink.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A sink accepts an already-serialized formatted document (a
//! `serde_json::Value`, produced by `curing-engine`'s formatter) so that
//! this crate never needs a dependency on the engine crate just to move
//! bytes to a destination. The path template may reference
//! `{process_id}`, `{series_id}`, and `{calculation_date}`; [`PathContext`]
//! supplies the values substituted in for a given run.

use crate::error::SinkError;

/// Run-scoped values a path template may reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathContext {
    /// Substituted for `{process_id}`.
    pub process_id: String,
    /// Substituted for `{series_id}`.
    pub series_id: String,
    /// Substituted for `{calculation_date}`, an already-formatted date or
    /// timestamp string.
    pub calculation_date: String,
}

/// A delivery implementation: local file, message bus, database, or API.
pub trait Sink {
    /// Writes `formatted_result` to the location `path_template` resolves
    /// to under `context`, and returns the resolved path.
    ///
    /// # Errors
    /// Returns [`SinkError`] if the template references an unsupported
    /// placeholder or the destination cannot be written.
    fn write(&self, formatted_result: &serde_json::Value, path_template: &str, context: &PathContext) -> Result<String, SinkError>;
}

/// Substitutes `{process_id}`, `{series_id}`, and `{calculation_date}` in
/// `template` from `context`.
///
/// # Errors
/// Returns [`SinkError::UnknownPlaceholder`] for any other `{name}`
/// placeholder found in the template.
pub fn resolve_path_template(template: &str, context: &PathContext) -> Result<String, SinkError> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close_offset) = rest[open..].find('}') else {
            resolved.push_str(rest);
            rest = "";
            break;
        };
        let close = open + close_offset;
        resolved.push_str(&rest[..open]);
        let placeholder = &rest[open + 1..close];
        let value = match placeholder {
            "process_id" => &context.process_id,
            "series_id" => &context.series_id,
            "calculation_date" => &context.calculation_date,
            other => return Err(SinkError::UnknownPlaceholder(other.to_string())),
        };
        resolved.push_str(value);
        rest = &rest[close + 1..];
    }
    resolved.push_str(rest);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, reason = "Test fixtures use explicit asserts and unwraps for clarity.")]

    use super::*;

    fn context() -> PathContext {
        PathContext { process_id: "autoclave-7".to_string(), series_id: "run-42".to_string(), calculation_date: "2026-08-01".to_string() }
    }

    #[test]
    fn substitutes_every_recognized_placeholder() {
        let resolved = resolve_path_template("out/{process_id}/{series_id}_{calculation_date}.json", &context()).expect("resolves");
        assert_eq!(resolved, "out/autoclave-7/run-42_2026-08-01.json");
    }

    #[test]
    fn unknown_placeholder_is_reported() {
        let result = resolve_path_template("out/{mystery}.json", &context());
        assert!(matches!(result, Err(SinkError::UnknownPlaceholder(name)) if name == "mystery"));
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let resolved = resolve_path_template("out/fixed.json", &context()).expect("resolves");
        assert_eq!(resolved, "out/fixed.json");
    }
}
