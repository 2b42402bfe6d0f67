// ============================================================================
// Module: Component Factory
// Description: The registry mapping a task's `(layer, implementation)` pair
//              to the concrete logic that runs it.
// Purpose: Let a workflow definition name components by string, resolved at
//          plan-build and execution time rather than wired by hand.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! Each DAG layer (source ingestion, grouping, calculation, stage
//! detection, rule evaluation, formatting, sink delivery) may have more than
//! one registered implementation; a task selects one by name. Registration
//! happens once at process startup, after which the factory is read-only and
//! safe to share across concurrently executing runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use curing_core::model::TaskDef;
use curing_core::model::WorkflowContext;

/// One unit of DAG work: reads whatever upstream keys it needs from
/// `context` and writes its own `processor_results[task.id]` entry (and, by
/// convention, any well-known key it owns).
pub trait Component: Send + Sync {
    /// Runs this component for `task` against the shared `context`.
    ///
    /// # Errors
    /// Returns a human-readable failure description; the orchestrator wraps
    /// it into [`crate::error::RunError::ComponentFailed`] and stops the run.
    fn run(&self, task: &TaskDef, context: &mut WorkflowContext) -> Result<(), String>;
}

/// Registry of `(layer, implementation) -> Component`, consulted by both
/// plan construction (to reject unknown references early) and execution (to
/// resolve each task's logic).
#[derive(Default)]
pub struct ComponentFactory {
    components: BTreeMap<(String, String), Arc<dyn Component>>,
}

impl ComponentFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component` for `(layer, implementation)`, replacing any
    /// prior registration for the same pair.
    pub fn register(&mut self, layer: impl Into<String>, implementation: impl Into<String>, component: impl Component + 'static) {
        self.components.insert((layer.into(), implementation.into()), Arc::new(component));
    }

    /// Returns true when a component is registered for `(layer,
    /// implementation)`.
    #[must_use]
    pub fn contains(&self, layer: &str, implementation: &str) -> bool {
        self.components.contains_key(&(layer.to_string(), implementation.to_string()))
    }

    /// Resolves the component registered for `(layer, implementation)`.
    #[must_use]
    pub fn resolve(&self, layer: &str, implementation: &str) -> Option<Arc<dyn Component>> {
        self.components.get(&(layer.to_string(), implementation.to_string())).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use curing_core::identifiers::TaskId;

    use super::*;

    struct NoOp;
    impl Component for NoOp {
        fn run(&self, _task: &TaskDef, _context: &mut WorkflowContext) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn registered_component_resolves_by_layer_and_implementation() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", NoOp);
        assert!(factory.contains("source", "csv"));
        assert!(factory.resolve("source", "csv").is_some());
        assert!(factory.resolve("source", "json").is_none());
    }

    #[test]
    fn component_runs_against_context() {
        let mut factory = ComponentFactory::new();
        factory.register("sink", "file", NoOp);
        let component = factory.resolve("sink", "file").expect("registered");
        let task = TaskDef {
            id: TaskId::new("t1"),
            layer: "sink".to_string(),
            implementation: "file".to_string(),
            algorithm: None,
            depends_on: vec![],
            parameters: std::collections::BTreeMap::new(),
        };
        let mut context = WorkflowContext::new();
        assert!(component.run(&task, &mut context).is_ok());
    }
}
