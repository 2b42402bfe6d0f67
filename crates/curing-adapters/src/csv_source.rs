// ============================================================================
// Module: CSV Source
// Description: Reads a local delimited-text file into a `SourcePayload`.
// Purpose: The reference local-file ingestion implementation; message bus,
//          database, and API sources are expected to implement the same
//          `Source` trait from elsewhere.
// Dependencies: curing-core, time
// ============================================================================

//! ## Overview
//! The header row names every channel; every other row is split on the
//! configured delimiter and converted cell-by-cell. A column is read as
//! [`curing_core::model::Sample::Number`] when every one of its cells
//! parses as `f64`, and as [`curing_core::model::Sample::Text`] otherwise
//! — so the timestamp column, and any categorical column, naturally come
//! out as text. Row width and timestamp monotonicity are checked before
//! the payload is returned, satisfying the structural half of the source
//! contract.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use curing_core::model::RawData;
use curing_core::model::Sample;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SourceError;
use crate::source::Source;
use crate::source::SourceMetadata;
use crate::source::SourcePayload;

/// Configuration for a [`CsvSource`].
#[derive(Debug, Clone)]
pub struct CsvSourceConfig {
    /// Path to the delimited-text file.
    pub path: PathBuf,
    /// Field delimiter, typically `,`.
    pub delimiter: char,
    /// Name of the header column holding the timestamp axis.
    pub timestamp_column: String,
}

impl CsvSourceConfig {
    /// Builds a config with a comma delimiter.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, timestamp_column: impl Into<String>) -> Self {
        Self { path: path.into(), delimiter: ',', timestamp_column: timestamp_column.into() }
    }
}

/// Reads sensor channels from a local delimited-text file.
pub struct CsvSource {
    config: CsvSourceConfig,
}

impl CsvSource {
    /// Creates a source over `config`.
    #[must_use]
    pub const fn new(config: CsvSourceConfig) -> Self {
        Self { config }
    }
}

impl Source for CsvSource {
    fn read(&self) -> Result<SourcePayload, SourceError> {
        let text = fs::read_to_string(&self.config.path).map_err(|source| SourceError::Io { path: self.config.path.clone(), detail: source.to_string() })?;
        parse_csv(&text, &self.config)
    }
}

fn parse_csv(text: &str, config: &CsvSourceConfig) -> Result<SourcePayload, SourceError> {
    let path = config.path.clone();
    let mut lines = text.lines();
    let header_line = lines.next().ok_or_else(|| SourceError::MissingHeader { path: path.clone() })?;
    let columns: Vec<String> = split_row(header_line, config.delimiter);
    if columns.is_empty() {
        return Err(SourceError::MissingHeader { path: path.clone() });
    }
    if !columns.iter().any(|column| column == &config.timestamp_column) {
        return Err(SourceError::MissingTimestampColumn { path: path.clone(), column: config.timestamp_column.clone() });
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); columns.len()];
    for (row_index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line, config.delimiter);
        if fields.len() != columns.len() {
            return Err(SourceError::RowWidthMismatch { path: path.clone(), row: row_index + 1, expected: columns.len(), actual: fields.len() });
        }
        for (slot, field) in cells.iter_mut().zip(fields) {
            slot.push(field);
        }
    }

    let row_count = cells.first().map_or(0, Vec::len);
    let mut channels: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
    for (column, values) in columns.iter().zip(cells) {
        channels.insert(column.clone(), values.iter().map(|text| as_sample(text)).collect());
    }

    check_monotone(&channels, &config.timestamp_column, &path)?;

    let data = RawData { channels, timestamp_channel: config.timestamp_column.clone() };
    let metadata = SourceMetadata { row_count, column_count: columns.len(), columns, timestamp_column: config.timestamp_column.clone() };
    Ok(SourcePayload { data, metadata })
}

fn split_row(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(|field| field.trim().to_string()).collect()
}

fn as_sample(text: &str) -> Sample {
    text.parse::<f64>().map_or_else(|_parse_error| Sample::Text(text.to_string()), Sample::Number)
}

fn check_monotone(channels: &BTreeMap<String, Vec<Sample>>, timestamp_column: &str, path: &Path) -> Result<(), SourceError> {
    let Some(samples) = channels.get(timestamp_column) else {
        return Err(SourceError::MissingTimestampColumn { path: path.to_path_buf(), column: timestamp_column.to_string() });
    };
    let mut previous: Option<OffsetDateTime> = None;
    for (index, sample) in samples.iter().enumerate() {
        let Sample::Text(text) = sample else { continue };
        let Ok(current) = OffsetDateTime::parse(text, &Rfc3339) else { continue };
        if let Some(previous_value) = previous {
            if current < previous_value {
                return Err(SourceError::NonMonotoneTimestamps { path: path.to_path_buf(), row: index + 1 });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, reason = "Test fixtures use explicit asserts and unwraps for clarity.")]

    use super::*;

    #[test]
    fn parses_numeric_and_text_columns() {
        let text = "timestamp,temperature,phase\n2026-01-01T00:00:00Z,20.0,heat\n2026-01-01T00:01:00Z,21.5,heat\n";
        let config = CsvSourceConfig::new("sample.csv", "timestamp");
        let payload = parse_csv(text, &config).expect("parses");
        assert_eq!(payload.metadata.row_count, 2);
        assert_eq!(payload.metadata.columns, vec!["timestamp", "temperature", "phase"]);
        assert_eq!(payload.data.channels["temperature"], vec![Sample::Number(20.0), Sample::Number(21.5)]);
        assert_eq!(payload.data.channels["phase"], vec![Sample::Text("heat".to_string()), Sample::Text("heat".to_string())]);
    }

    #[test]
    fn missing_timestamp_column_is_rejected() {
        let text = "temperature\n20.0\n";
        let config = CsvSourceConfig::new("sample.csv", "timestamp");
        assert!(matches!(parse_csv(text, &config), Err(SourceError::MissingTimestampColumn { .. })));
    }

    #[test]
    fn ragged_row_is_rejected() {
        let text = "timestamp,temperature\n2026-01-01T00:00:00Z,20.0,extra\n";
        let config = CsvSourceConfig::new("sample.csv", "timestamp");
        assert!(matches!(parse_csv(text, &config), Err(SourceError::RowWidthMismatch { .. })));
    }

    #[test]
    fn out_of_order_timestamps_are_rejected() {
        let text = "timestamp,temperature\n2026-01-01T00:01:00Z,21.0\n2026-01-01T00:00:00Z,20.0\n";
        let config = CsvSourceConfig::new("sample.csv", "timestamp");
        assert!(matches!(parse_csv(text, &config), Err(SourceError::NonMonotoneTimestamps { .. })));
    }
}
