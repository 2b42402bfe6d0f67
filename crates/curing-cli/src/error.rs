// ============================================================================
// Module: CLI Errors
// Description: Wraps every failure the `curing` binary can produce and maps
//              it to the exit code contract the orchestrator defines for
//              library callers.
// Purpose: One place translating heterogeneous crate errors into the
//          0/1/2/3 exit code scheme, so `main` itself stays a thin dispatcher.
// Dependencies: curing-adapters, curing-config, curing-orchestrator, thiserror
// ============================================================================

//! Wraps every failure the `curing` binary can produce into an exit code.

use std::process::ExitCode;

use thiserror::Error;

/// Every failure the CLI can surface, tagged with the exit code it maps to.
#[derive(Debug, Error)]
pub enum CliError {
    /// Template or specification loading failed.
    #[error(transparent)]
    Registry(#[from] curing_config::RegistryError),
    /// Binding a specification to a sensor grouping failed.
    #[error(transparent)]
    Bind(#[from] curing_config::BindError),
    /// The run's sensor grouping document failed to parse.
    #[error("failed to parse sensor grouping at {path:?}: {source}")]
    GroupingParse {
        /// Path to the sensor grouping document.
        path: std::path::PathBuf,
        /// Underlying parse failure.
        source: serde_yaml::Error,
    },
    /// Reading a configuration file from disk failed.
    #[error("failed to read {path:?}: {source}")]
    ConfigIo {
        /// Path that could not be read.
        path: std::path::PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Building the execution plan failed (cycle, missing dependency,
    /// unregistered component).
    #[error(transparent)]
    Plan(#[from] curing_orchestrator::PlanError),
    /// A task failed or the run was cancelled while executing.
    #[error("workflow run failed: {0}")]
    Run(String),
    /// Resolving a configured source or sink implementation failed.
    #[error(transparent)]
    Source(#[from] curing_adapters::SourceError),
    /// Delivering the formatted result through a sink failed.
    #[error(transparent)]
    Sink(#[from] curing_adapters::SinkError),
    /// The formatted document could not be serialized.
    #[error("failed to serialize formatted result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    /// Maps this error to the exit code contract: 1 for a validation
    /// failure before execution, 2 for a configuration failure, 3 for a
    /// runtime task failure.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Plan(_) => ExitCode::from(1),
            Self::Registry(_) | Self::Bind(_) | Self::GroupingParse { .. } | Self::ConfigIo { .. } => ExitCode::from(2),
            Self::Run(_) | Self::Source(_) | Self::Sink(_) | Self::Serialize(_) => ExitCode::from(3),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test fixtures use explicit asserts, unwraps, and Debug-based comparison (ExitCode has no PartialEq) for clarity."
    )]

    use super::*;

    #[test]
    fn plan_failure_maps_to_exit_code_one() {
        let error = CliError::Plan(curing_orchestrator::PlanError::DuplicateTask(curing_core::identifiers::TaskId::new("a")));
        assert_eq!(format!("{:?}", error.exit_code()), format!("{:?}", ExitCode::from(1)));
    }

    #[test]
    fn run_failure_maps_to_exit_code_three() {
        let error = CliError::Run("boom".to_string());
        assert_eq!(format!("{:?}", error.exit_code()), format!("{:?}", ExitCode::from(3)));
    }
}
