// ============================================================================
// Module: File Sink
// Description: Writes a formatted document to a local path resolved from a
//              path template.
// Purpose: The reference local-file delivery implementation; message bus,
//          database, and API sinks are expected to implement the same
//          `Sink` trait from elsewhere.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The resolved path's parent directories are created if absent, then the
//! document is written as pretty-printed JSON. One document per path; this
//! sink does not append, so a reused path template overwrites the prior
//! result.

use std::fs;
use std::path::PathBuf;

use crate::error::SinkError;
use crate::sink::resolve_path_template;
use crate::sink::PathContext;
use crate::sink::Sink;

/// Writes formatted documents under `root`.
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// Creates a sink rooted at `root`; resolved paths are joined under it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Sink for FileSink {
    fn write(&self, formatted_result: &serde_json::Value, path_template: &str, context: &PathContext) -> Result<String, SinkError> {
        let relative = resolve_path_template(path_template, context)?;
        let resolved = self.root.join(&relative);
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|source| SinkError::Io { path: resolved.clone(), detail: source.to_string() })?;
        }
        let body = serde_json::to_vec_pretty(formatted_result).map_err(|source| SinkError::Io { path: resolved.clone(), detail: source.to_string() })?;
        fs::write(&resolved, body).map_err(|source| SinkError::Io { path: resolved.clone(), detail: source.to_string() })?;
        tracing::debug!(path = %resolved.display(), "wrote formatted document");
        Ok(resolved.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, reason = "Test fixtures use explicit asserts and unwraps for clarity.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn writes_resolved_path_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileSink::new(dir.path());
        let context = PathContext { process_id: "autoclave-7".to_string(), series_id: "run-42".to_string(), calculation_date: "2026-08-01".to_string() };
        let resolved = sink.write(&json!({"status": "pass"}), "{process_id}/{series_id}.json", &context).expect("writes");
        assert!(resolved.ends_with("autoclave-7/run-42.json"));
        let contents = fs::read_to_string(&resolved).expect("reads back");
        assert!(contents.contains("\"status\""));
    }

    #[test]
    fn unknown_placeholder_fails_before_touching_the_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileSink::new(dir.path());
        let context = PathContext::default();
        let result = sink.write(&json!({}), "{mystery}.json", &context);
        assert!(matches!(result, Err(SinkError::UnknownPlaceholder(name)) if name == "mystery"));
    }
}
