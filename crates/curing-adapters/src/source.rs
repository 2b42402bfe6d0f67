// ============================================================================
// Module: Source Contract
// Description: The adapter-facing contract every ingestion implementation
//              satisfies, plus the payload shape it returns.
// Purpose: Let the orchestrator depend on one trait regardless of whether
//          readings come from a local file, a message bus, a database, or
//          an API — none of which this crate's concrete sources need to be
//          aware of beyond the one it implements.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! A source validates its own configuration and then produces a
//! [`SourcePayload`]: the ingested [`curing_core::model::RawData`] plus
//! descriptive [`SourceMetadata`]. Every implementation is responsible for
//! the two structural guarantees a downstream consumer relies on: every
//! channel shares the timestamp channel's length, and the timestamp channel
//! is monotone non-decreasing.

use curing_core::model::RawData;

use crate::error::SourceError;

/// Descriptive counts and column identity alongside the ingested data.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Number of samples per channel.
    pub row_count: usize,
    /// Number of channels, including the timestamp channel.
    pub column_count: usize,
    /// Channel names in the order they appeared in the source document.
    pub columns: Vec<String>,
    /// Name of the channel designated as the timestamp axis.
    pub timestamp_column: String,
}

/// The full result of a source read: data plus the metadata describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePayload {
    /// The ingested channels.
    pub data: RawData,
    /// Counts and column identity describing `data`.
    pub metadata: SourceMetadata,
}

/// An ingestion implementation: local file, message bus, database, or API.
pub trait Source {
    /// Reads one run's worth of sensor data.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the configuration is invalid, the
    /// backing store cannot be reached, or the produced data would violate
    /// the equal-length / monotone-timestamp guarantees.
    fn read(&self) -> Result<SourcePayload, SourceError>;
}
