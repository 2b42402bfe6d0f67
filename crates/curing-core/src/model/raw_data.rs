// ============================================================================
// Module: RawData
// Description: The run's ingested sensor channels, keyed by channel name,
//              with one designated timestamp axis.
// Purpose: The single entry point raw samples take into the engine.
// Dependencies: serde, time
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use thiserror::Error;

pub use crate::value::SeriesPoint as TimeSeriesPoint;

/// An ordered per-timestamp value bundle, produced by the calculation engine
/// or a sensor-group zip.
pub type TimeSeries = Vec<TimeSeriesPoint>;

/// A single raw reading. The timestamp channel's samples are always `Text`
/// (RFC 3339); every other channel is ordinarily `Number`, with `Text`
/// reserved for categorical channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sample {
    /// A numeric reading.
    Number(f64),
    /// A textual reading (timestamps, categorical channels).
    Text(String),
}

impl Sample {
    /// Returns the sample as `f64`, if numeric.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

/// Failure to interpret `RawData` as well-formed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawDataError {
    /// The named timestamp channel does not exist.
    #[error("timestamp channel {0:?} not present in raw data")]
    MissingTimestampChannel(String),
    /// A channel's sample count did not match the timestamp channel's.
    #[error("channel {channel:?} has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// Offending channel name.
        channel: String,
        /// Actual sample count.
        actual: usize,
        /// Expected sample count (the timestamp channel's length).
        expected: usize,
    },
    /// A timestamp channel sample was not a parseable RFC 3339 string.
    #[error("timestamp channel sample at index {index} is not RFC 3339: {text:?}")]
    InvalidTimestamp {
        /// Index of the offending sample.
        index: usize,
        /// The raw text that failed to parse.
        text: String,
    },
}

/// `{channel_name -> ordered sequence of samples}`, with one channel
/// designated as the timestamp axis.
///
/// # Invariants
/// - All channels share the same length.
/// - The timestamp channel is monotone non-decreasing (checked by
///   [`RawData::timestamps`], not enforced at construction).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    /// All ingested channels, keyed by channel name.
    pub channels: BTreeMap<String, Vec<Sample>>,
    /// Name of the channel holding the timestamp axis.
    pub timestamp_channel: String,
}

impl RawData {
    /// Number of samples in the run (the timestamp channel's length).
    ///
    /// # Errors
    /// Returns [`RawDataError::MissingTimestampChannel`] if the designated
    /// channel is absent.
    pub fn len(&self) -> Result<usize, RawDataError> {
        self.channels
            .get(&self.timestamp_channel)
            .map(Vec::len)
            .ok_or_else(|| RawDataError::MissingTimestampChannel(self.timestamp_channel.clone()))
    }

    /// Returns true when the run has zero samples.
    ///
    /// # Errors
    /// Returns [`RawDataError::MissingTimestampChannel`] if the designated
    /// channel is absent.
    pub fn is_empty(&self) -> Result<bool, RawDataError> {
        self.len().map(|length| length == 0)
    }

    /// Parses the timestamp channel into [`OffsetDateTime`] values.
    ///
    /// # Errors
    /// Returns [`RawDataError::MissingTimestampChannel`] if the channel is
    /// absent, or [`RawDataError::InvalidTimestamp`] if a sample is not a
    /// parseable RFC 3339 string.
    pub fn timestamps(&self) -> Result<Vec<OffsetDateTime>, RawDataError> {
        let samples = self
            .channels
            .get(&self.timestamp_channel)
            .ok_or_else(|| RawDataError::MissingTimestampChannel(self.timestamp_channel.clone()))?;
        samples
            .iter()
            .enumerate()
            .map(|(index, sample)| match sample {
                Sample::Text(text) => OffsetDateTime::parse(text, &Rfc3339).map_err(|_parse_error| {
                    RawDataError::InvalidTimestamp {
                        index,
                        text: text.clone(),
                    }
                }),
                Sample::Number(_) => Err(RawDataError::InvalidTimestamp {
                    index,
                    text: String::new(),
                }),
            })
            .collect()
    }

    /// Verifies every channel shares the timestamp channel's length.
    ///
    /// # Errors
    /// Returns [`RawDataError::LengthMismatch`] on the first offending
    /// channel found, or [`RawDataError::MissingTimestampChannel`] if the
    /// timestamp channel itself is missing.
    pub fn validate_lengths(&self) -> Result<(), RawDataError> {
        let expected = self.len()?;
        for (channel, samples) in &self.channels {
            if samples.len() != expected {
                return Err(RawDataError::LengthMismatch {
                    channel: channel.clone(),
                    actual: samples.len(),
                    expected,
                });
            }
        }
        Ok(())
    }
}
