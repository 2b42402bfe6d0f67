// ============================================================================
// Module: Plan Builder
// Description: Turns a flat task list into a validated, topologically
//              ordered `ExecutionPlan`.
// Purpose: Catch duplicate ids, dangling dependencies, unregistered
//          components, and dependency cycles before a run ever starts.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! A workflow definition is conceptually a list of layers, each a list of
//! tasks; since [`curing_core::model::TaskDef`] already carries its own
//! `layer` field, the builder works over the flattened task list directly
//! rather than a separate layer-grouping structure. Ordering ties (multiple
//! tasks simultaneously eligible to run) break by declaration order: the
//! builder always advances the earliest still-eligible task in the input
//! list, never an arbitrary one.

use std::collections::BTreeSet;

use curing_core::identifiers::TaskId;
use curing_core::model::ExecutionPlan;
use curing_core::model::TaskDef;

use crate::component::ComponentFactory;
use crate::error::PlanError;

/// Validates `tasks` and produces an [`ExecutionPlan`] with a stable
/// topological `order`.
///
/// # Errors
/// Returns [`PlanError::DuplicateTask`] for a repeated id,
/// [`PlanError::MissingDependency`] for a `depends_on` entry naming an
/// undeclared task, [`PlanError::UnknownComponent`] for a `(layer,
/// implementation)` pair absent from `factory`, or [`PlanError::Cycle`] if
/// the dependency graph cannot be fully ordered.
pub fn build_plan(tasks: Vec<TaskDef>, factory: &ComponentFactory) -> Result<ExecutionPlan, PlanError> {
    let mut seen: BTreeSet<TaskId> = BTreeSet::new();
    for task in &tasks {
        if !seen.insert(task.id.clone()) {
            return Err(PlanError::DuplicateTask(task.id.clone()));
        }
    }

    for task in &tasks {
        for dependency in &task.depends_on {
            if !seen.contains(dependency) {
                return Err(PlanError::MissingDependency { task: task.id.clone(), dependency: dependency.clone() });
            }
        }
        if !factory.contains(&task.layer, &task.implementation) {
            return Err(PlanError::UnknownComponent { layer: task.layer.clone(), implementation: task.implementation.clone() });
        }
    }

    let order = topological_order(&tasks)?;
    Ok(ExecutionPlan { tasks, order, parameters: std::collections::BTreeMap::new() })
}

fn topological_order(tasks: &[TaskDef]) -> Result<Vec<TaskId>, PlanError> {
    let mut resolved: BTreeSet<TaskId> = BTreeSet::new();
    let mut remaining: Vec<&TaskDef> = tasks.iter().collect();
    let mut order = Vec::with_capacity(tasks.len());

    while !remaining.is_empty() {
        let index = remaining.iter().position(|task| task.depends_on.iter().all(|dependency| resolved.contains(dependency)));
        let Some(index) = index else {
            return Err(PlanError::Cycle(remaining.iter().map(|task| task.id.clone()).collect()));
        };
        let task = remaining.remove(index);
        resolved.insert(task.id.clone());
        order.push(task.id.clone());
    }

    Ok(order)
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

    use curing_core::model::WorkflowContext;

    use super::*;
    use crate::component::Component;

    struct NoOp;
    impl Component for NoOp {
        fn run(&self, _task: &TaskDef, _context: &mut WorkflowContext) -> Result<(), String> {
            Ok(())
        }
    }

    fn factory() -> ComponentFactory {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", NoOp);
        factory.register("calculation", "default", NoOp);
        factory
    }

    fn task(id: &str, layer: &str, implementation: &str, depends_on: &[&str]) -> TaskDef {
        TaskDef {
            id: TaskId::new(id),
            layer: layer.to_string(),
            implementation: implementation.to_string(),
            algorithm: None,
            depends_on: depends_on.iter().map(|dep| TaskId::new(*dep)).collect(),
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let tasks = vec![task("calc", "calculation", "default", &["ingest"]), task("ingest", "source", "csv", &[])];
        let plan = build_plan(tasks, &factory()).expect("builds");
        assert_eq!(plan.order, vec![TaskId::new("ingest"), TaskId::new("calc")]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let tasks = vec![task("a", "source", "csv", &[]), task("a", "source", "csv", &[])];
        assert_eq!(build_plan(tasks, &factory()), Err(PlanError::DuplicateTask(TaskId::new("a"))));
    }

    #[test]
    fn missing_dependency_is_rejected() {
        let tasks = vec![task("a", "source", "csv", &["ghost"])];
        assert_eq!(build_plan(tasks, &factory()), Err(PlanError::MissingDependency { task: TaskId::new("a"), dependency: TaskId::new("ghost") }));
    }

    #[test]
    fn unregistered_component_is_rejected() {
        let tasks = vec![task("a", "sink", "mystery", &[])];
        assert_eq!(build_plan(tasks, &factory()), Err(PlanError::UnknownComponent { layer: "sink".to_string(), implementation: "mystery".to_string() }));
    }

    #[test]
    fn cyclic_dependencies_are_rejected() {
        let tasks = vec![task("a", "source", "csv", &["b"]), task("b", "source", "csv", &["a"])];
        let result = build_plan(tasks, &factory());
        assert!(matches!(result, Err(PlanError::Cycle(_))));
    }

    #[test]
    fn ties_break_by_declaration_order() {
        let tasks = vec![task("second", "source", "csv", &[]), task("first", "source", "csv", &[])];
        let plan = build_plan(tasks, &factory()).expect("builds");
        assert_eq!(plan.order, vec![TaskId::new("second"), TaskId::new("first")]);
    }
}
