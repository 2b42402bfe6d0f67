// ============================================================================
// Module: Adapter Errors
// Description: Failure types for source ingestion and sink delivery.
// Purpose: Keep filesystem and parsing failures distinguishable from the
//          shape violations a source or sink contract forbids.
// Dependencies: thiserror
// ============================================================================

//! Failure types for source ingestion and sink delivery.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a well-formed [`crate::source::SourcePayload`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing file could not be opened or read.
    #[error("failed to read {path:?}: {detail}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure text.
        detail: String,
    },
    /// The document had no header row, or the header row was empty.
    #[error("{path:?} has no header row")]
    MissingHeader {
        /// Path whose header row is missing.
        path: PathBuf,
    },
    /// A data row did not have one field per header column.
    #[error("{path:?} row {row}: expected {expected} columns, found {actual}")]
    RowWidthMismatch {
        /// Path the offending row came from.
        path: PathBuf,
        /// 1-based row number within the data rows (excluding the header).
        row: usize,
        /// Number of header columns.
        expected: usize,
        /// Number of fields found on the row.
        actual: usize,
    },
    /// The configured timestamp column is not among the header columns.
    #[error("{path:?} has no column named {column:?}")]
    MissingTimestampColumn {
        /// Path that was read.
        path: PathBuf,
        /// The configured timestamp column name.
        column: String,
    },
    /// The timestamp column's samples are not monotone non-decreasing.
    #[error("{path:?} timestamp column is not monotone at row {row}")]
    NonMonotoneTimestamps {
        /// Path that was read.
        path: PathBuf,
        /// 1-based data row at which monotonicity broke.
        row: usize,
    },
    /// A requested source name has no registered implementation.
    #[error("no source registered for {0:?}")]
    UnknownImplementation(String),
    /// A source implementation was requested that the active policy denies.
    #[error("source {0:?} is not permitted by the active access policy")]
    Denied(String),
}

/// Failure to deliver a formatted document through a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The destination file or directory could not be written.
    #[error("failed to write {path:?}: {detail}")]
    Io {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O failure text.
        detail: String,
    },
    /// The path template referenced a placeholder the run context does not
    /// supply.
    #[error("path template references unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),
    /// A requested sink name has no registered implementation.
    #[error("no sink registered for {0:?}")]
    UnknownImplementation(String),
    /// A sink implementation was requested that the active policy denies.
    #[error("sink {0:?} is not permitted by the active access policy")]
    Denied(String),
}
