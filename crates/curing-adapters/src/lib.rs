// crates/curing-adapters/src/lib.rs
// ============================================================================
// Module: Curing Adapters
// Description: Source and sink contracts for sensor data ingestion and
//              formatted-document delivery, a reference CSV source and
//              file sink, and policy-guarded registries over both.
// Purpose: Isolate every filesystem/network/database concern behind two
//          narrow traits so the engine and orchestrator never know where a
//          run's data came from or where its results end up.
// Dependencies: curing-core, serde_json, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! [`source`] and [`sink`] define the two adapter traits; [`csv_source`]
//! and [`file_sink`] are the reference local-file implementations;
//! [`registry`] holds name-keyed, access-policy-guarded registries of
//! both. A deployment wanting a message bus, database, or API adapter
//! implements [`source::Source`] or [`sink::Sink`] and registers it the
//! same way.

pub mod csv_source;
pub mod error;
pub mod file_sink;
pub mod registry;
pub mod sink;
pub mod source;

pub use csv_source::CsvSource;
pub use csv_source::CsvSourceConfig;
pub use error::SinkError;
pub use error::SourceError;
pub use file_sink::FileSink;
pub use registry::AccessPolicy;
pub use registry::SinkRegistry;
pub use registry::SourceRegistry;
pub use sink::PathContext;
pub use sink::Sink;
pub use source::Source;
pub use source::SourceMetadata;
pub use source::SourcePayload;
