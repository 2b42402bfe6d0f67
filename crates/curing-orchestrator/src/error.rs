// ============================================================================
// Module: Orchestrator Errors
// Description: Failures raised while building or executing a workflow plan.
// Purpose: One failure type per orchestrator responsibility, mirroring the
//          rest of the workspace's error conventions.
// Dependencies: thiserror, curing-core
// ============================================================================

//! Errors raised while building or executing a workflow plan.

use curing_core::identifiers::TaskId;
use thiserror::Error;

/// Failures raised while turning a task list into an [`crate::ExecutionPlan`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Two tasks declared the same id.
    #[error("duplicate task id `{0}`")]
    DuplicateTask(TaskId),
    /// A task's `depends_on` named an id absent from the plan.
    #[error("task `{task}` depends on undeclared task `{dependency}`")]
    MissingDependency {
        /// The task making the reference.
        task: TaskId,
        /// The undeclared dependency.
        dependency: TaskId,
    },
    /// A task named a `(layer, implementation)` pair with no registered
    /// component.
    #[error("no component registered for layer `{layer}` implementation `{implementation}`")]
    UnknownComponent {
        /// The task's declared layer.
        layer: String,
        /// The task's declared implementation.
        implementation: String,
    },
    /// The dependency graph contains a cycle; the listed tasks could not be
    /// ordered.
    #[error("dependency cycle among tasks: {0:?}")]
    Cycle(Vec<TaskId>),
}

/// Failures raised while executing a plan.
#[derive(Debug, Error)]
pub enum RunError {
    /// A task's component reported a failure.
    #[error("task `{task}` failed: {detail}")]
    ComponentFailed {
        /// The failing task.
        task: TaskId,
        /// The component's own failure message.
        detail: String,
    },
    /// The run was cancelled before a task started.
    #[error("run cancelled before task `{task}`")]
    Cancelled {
        /// The task that would have run next.
        task: TaskId,
    },
}
