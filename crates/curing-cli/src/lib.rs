// crates/curing-cli/src/lib.rs
// ============================================================================
// Module: Curing CLI Library
// Description: Shared helpers for the `curing` command-line interface.
// Purpose: Keep the component wiring and error mapping testable separately
//          from the binary's argument parsing and `main` dispatch.
// Dependencies: curing-adapters, curing-config, curing-core, curing-engine,
//               curing-orchestrator
// ============================================================================

//! ## Overview
//! [`components`] adapts the engine and adapter crates into orchestrator
//! `Component`s; [`error`] maps every failure this binary can produce to
//! the orchestrator's 0/1/2/3 exit code contract.

pub mod components;
pub mod error;
