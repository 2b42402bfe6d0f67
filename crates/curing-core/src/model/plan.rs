// ============================================================================
// Module: ExecutionPlan
// Description: A topologically-ordered task list with dependency edges, as
//              produced by the orchestrator's plan builder.
// Purpose: Let the orchestrator, the workflow cache, and tests all share one
//          representation of "what runs, in what order".
// Dependencies: serde
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::TaskId;
use crate::model::param::ParamValue;

/// One task in a workflow definition: a layer implementation keyed by
/// `(layer, implementation)`, an optional algorithm selector, its
/// dependency edges, and its configured parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    /// Identifier, unique within the plan.
    pub id: TaskId,
    /// The DAG layer this task belongs to (e.g. `"stage_detection"`).
    pub layer: String,
    /// Which registered implementation handles this layer for this task.
    pub implementation: String,
    /// Optional algorithm selector passed through to the implementation.
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Task ids that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
    /// Parameters passed to the resolved component.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

/// A topologically-ordered task list with dependency edges and per-task
/// configuration.
///
/// # Invariants
/// - The dependency graph induced by every task's `depends_on` is acyclic.
/// - Every `depends_on` entry names a task id present in `tasks`.
/// - `order` is a permutation of `tasks`' ids consistent with the
///   dependency graph (stable tie-break by declaration order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Every task in the plan, in declaration order.
    pub tasks: Vec<TaskDef>,
    /// A valid topological ordering of `tasks`' ids.
    pub order: Vec<TaskId>,
    /// Plan-wide parameters available to every task.
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl ExecutionPlan {
    /// Looks up a task definition by id.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&TaskDef> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Iterates tasks in their resolved topological order.
    pub fn ordered_tasks(&self) -> impl Iterator<Item = &TaskDef> {
        self.order.iter().filter_map(|id| self.task(id))
    }
}
