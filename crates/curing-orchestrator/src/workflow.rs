// ============================================================================
// Module: Workflow Execution
// Description: Drives a validated `ExecutionPlan` through its component
//              factory against one `WorkflowContext`.
// Purpose: The single place that owns "stop on first failure" and
//          "check cancellation between tasks" semantics.
// Dependencies: curing-core, time
// ============================================================================

//! ## Overview
//! Execution is strictly sequential through the plan's topological order —
//! no branching on a task's own result, no speculative parallelism. A
//! [`CancellationToken`] is checked before each task starts; a cancelled run
//! stops without starting the next task. A component failure stops the run
//! immediately and is recorded rather than propagated as a panic, so the
//! caller always gets back a complete, inspectable context.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use curing_core::model::ExecutionPlan;
use curing_core::model::WorkflowContext;
use time::OffsetDateTime;

use crate::component::ComponentFactory;
use crate::error::RunError;

/// A shared flag a caller can raise from another thread to stop a run
/// between tasks.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the cancellation flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The outcome of one workflow run.
#[derive(Debug)]
pub struct WorkflowOutcome {
    /// Whether every task completed without failure or cancellation.
    pub success: bool,
    /// The context as it stood when the run stopped.
    pub context: WorkflowContext,
    /// `true` when the run stopped due to cancellation rather than failure.
    pub cancelled: bool,
    /// The first failure encountered, if any.
    pub failure: Option<RunError>,
}

/// Executes `plan`'s tasks, in topological order, against `context`.
///
/// Always returns a [`WorkflowOutcome`]; never panics on a task failure.
#[must_use]
pub fn run_workflow(plan: &ExecutionPlan, factory: &ComponentFactory, mut context: WorkflowContext, cancellation: &CancellationToken) -> WorkflowOutcome {
    for task in plan.ordered_tasks() {
        if cancellation.is_cancelled() {
            return WorkflowOutcome { success: false, context, cancelled: true, failure: Some(RunError::Cancelled { task: task.id.clone() }) };
        }

        let Some(component) = factory.resolve(&task.layer, &task.implementation) else {
            let failure = RunError::ComponentFailed { task: task.id.clone(), detail: "no component registered for this layer/implementation".to_string() };
            tracing::warn!(task = %task.id, "{failure}");
            return WorkflowOutcome { success: false, context, cancelled: false, failure: Some(failure) };
        };

        if let Err(detail) = component.run(task, &mut context) {
            let failure = RunError::ComponentFailed { task: task.id.clone(), detail };
            tracing::warn!(task = %task.id, "{failure}");
            return WorkflowOutcome { success: false, context, cancelled: false, failure: Some(failure) };
        }

        context.last_updated = Some(now());
    }

    WorkflowOutcome { success: true, context, cancelled: false, failure: None }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::collections::BTreeMap;

    use curing_core::identifiers::TaskId;
    use curing_core::model::TaskDef;

    use super::*;
    use crate::component::Component;

    #[allow(dead_code, reason = "Field documents which task id the fixture stands in for.")]
    struct Recording(TaskId);
    impl Component for Recording {
        fn run(&self, task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String> {
            context.set_processor_result(task.id.clone(), curing_core::Value::Bool(true), OffsetDateTime::UNIX_EPOCH);
            Ok(())
        }
    }

    struct AlwaysFails;
    impl Component for AlwaysFails {
        fn run(&self, _task: &TaskDef, _context: &mut WorkflowContext) -> Result<(), String> {
            Err("boom".to_string())
        }
    }

    fn task(id: &str, layer: &str, implementation: &str) -> TaskDef {
        TaskDef { id: TaskId::new(id), layer: layer.to_string(), implementation: implementation.to_string(), algorithm: None, depends_on: vec![], parameters: BTreeMap::new() }
    }

    #[test]
    fn runs_every_task_in_order_and_records_results() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", Recording(TaskId::new("a")));
        let plan = ExecutionPlan { tasks: vec![task("a", "source", "csv")], order: vec![TaskId::new("a")], parameters: BTreeMap::new() };
        let outcome = run_workflow(&plan, &factory, WorkflowContext::new(), &CancellationToken::new());
        assert!(outcome.success);
        assert!(outcome.context.processor_result(&TaskId::new("a")).is_some());
    }

    #[test]
    fn component_failure_stops_the_run() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", AlwaysFails);
        factory.register("calculation", "default", Recording(TaskId::new("b")));
        let plan = ExecutionPlan {
            tasks: vec![task("a", "source", "csv"), task("b", "calculation", "default")],
            order: vec![TaskId::new("a"), TaskId::new("b")],
            parameters: BTreeMap::new(),
        };
        let outcome = run_workflow(&plan, &factory, WorkflowContext::new(), &CancellationToken::new());
        assert!(!outcome.success);
        assert!(outcome.context.processor_result(&TaskId::new("b")).is_none());
    }

    #[test]
    fn cancellation_stops_before_the_next_task() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", Recording(TaskId::new("a")));
        let plan = ExecutionPlan { tasks: vec![task("a", "source", "csv")], order: vec![TaskId::new("a")], parameters: BTreeMap::new() };
        let token = CancellationToken::new();
        token.cancel();
        let outcome = run_workflow(&plan, &factory, WorkflowContext::new(), &token);
        assert!(outcome.cancelled);
        assert!(outcome.context.processor_result(&TaskId::new("a")).is_none());
    }
}
