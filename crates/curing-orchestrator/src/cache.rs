// ============================================================================
// Module: Workflow Cache
// Description: A small mutex-guarded LRU cache of built execution plans,
//              keyed by workflow name and a fingerprint of its task list.
// Purpose: Avoid rebuilding (and re-validating) the same plan on every run
//          of a workflow whose definition has not changed.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! The fingerprint folds in only task identities, `depends_on` edges,
//! declared `layer`/`implementation`/`algorithm`, and configured parameters
//! — never a run's raw sensor data — so identical workflow definitions
//! always hit regardless of what data they are later run against. No LRU
//! crate sits in this workspace's dependency graph, so the cache is a plain
//! mutex-guarded, most-recently-used-first `Vec`, evicted from the back once
//! past capacity.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use curing_core::model::ExecutionPlan;
use curing_core::model::TaskDef;

use crate::component::ComponentFactory;
use crate::error::PlanError;
use crate::plan::build_plan;

/// Default maximum number of cached plans.
pub const DEFAULT_CAPACITY: usize = 2;

type CacheKey = (String, u64);

/// A bounded, mutex-guarded cache of built plans.
pub struct WorkflowCache {
    capacity: usize,
    entries: Mutex<Vec<(CacheKey, ExecutionPlan)>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for WorkflowCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl WorkflowCache {
    /// Creates an empty cache holding at most `capacity` plans.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), entries: Mutex::new(Vec::new()), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Returns a cached plan for `(workflow_name, tasks)` if one exists,
    /// building (and validating) a fresh one otherwise.
    ///
    /// # Errors
    /// Propagates [`PlanError`] from [`build_plan`] on a cache miss.
    pub fn get_or_build(&self, workflow_name: &str, tasks: Vec<TaskDef>, factory: &ComponentFactory) -> Result<ExecutionPlan, PlanError> {
        let key = (workflow_name.to_string(), fingerprint(&tasks));

        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(position) = entries.iter().position(|(existing, _)| existing == &key) {
            let (_, plan) = entries.remove(position);
            entries.push((key, plan.clone()));
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(plan);
        }
        drop(entries);

        self.misses.fetch_add(1, Ordering::Relaxed);
        let plan = build_plan(tasks, factory)?;

        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push((key, plan.clone()));
        while entries.len() > self.capacity {
            entries.remove(0);
        }
        Ok(plan)
    }

    /// Total cache hits since creation.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses since creation.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

fn fingerprint(tasks: &[TaskDef]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for task in tasks {
        task.id.as_str().hash(&mut hasher);
        task.layer.hash(&mut hasher);
        task.implementation.hash(&mut hasher);
        task.algorithm.hash(&mut hasher);
        for dependency in &task.depends_on {
            dependency.as_str().hash(&mut hasher);
        }
        format!("{:?}", task.parameters).hash(&mut hasher);
    }
    hasher.finish()
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
    use crate::component::Component;
    use curing_core::model::WorkflowContext;

    struct NoOp;
    impl Component for NoOp {
        fn run(&self, _task: &TaskDef, _context: &mut WorkflowContext) -> Result<(), String> {
            Ok(())
        }
    }

    fn tasks() -> Vec<TaskDef> {
        vec![TaskDef { id: TaskId::new("a"), layer: "source".to_string(), implementation: "csv".to_string(), algorithm: None, depends_on: vec![], parameters: std::collections::BTreeMap::new() }]
    }

    #[test]
    fn second_lookup_with_identical_tasks_is_a_hit() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", NoOp);
        let cache = WorkflowCache::default();
        cache.get_or_build("wf", tasks(), &factory).expect("builds");
        cache.get_or_build("wf", tasks(), &factory).expect("builds");
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let mut factory = ComponentFactory::new();
        factory.register("source", "csv", NoOp);
        let cache = WorkflowCache::new(1);
        cache.get_or_build("wf-a", tasks(), &factory).expect("builds");
        cache.get_or_build("wf-b", tasks(), &factory).expect("builds");
        cache.get_or_build("wf-a", tasks(), &factory).expect("builds");
        assert_eq!(cache.misses(), 3);
    }
}
