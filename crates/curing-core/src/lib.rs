// crates/curing-core/src/lib.rs
// ============================================================================
// Module: Curing Core
// Description: Shared entity types, identifiers, and the dynamic value type
//              used across the curing compliance engine.
// Purpose: Give every other crate in the workspace one vocabulary of types
//          with no dependency on configuration loading, expression
//          evaluation, or orchestration.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! `curing-core` has no behavior of its own beyond the small set of helper
//! methods attached to its types. It exists so that `curing-config`,
//! `curing-expr`, `curing-engine`, `curing-orchestrator`, and `curing-adapters`
//! can pass templates, specifications, raw data, and run state between each
//! other without depending on one another directly.

pub mod identifiers;
pub mod model;
pub mod value;

pub use value::SeriesPoint;
pub use value::Value;
