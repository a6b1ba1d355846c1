//! Error types for barstream.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for barstream operations.
pub type Result<T> = std::result::Result<T, BarstreamError>;

/// Errors that can occur while ingesting and transforming a series.
///
/// The first four variants are recoverable per observation: the offending
/// input is dropped and the series state is left untouched.
#[derive(Error, Debug)]
pub enum BarstreamError {
    /// Timestamp could not be parsed or fell outside the plausible range.
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Bar failed structural validation.
    #[error("Invalid bar at {time}: {defect}")]
    InvalidBar {
        /// Bar time in epoch seconds (0 if unknown).
        time: i64,
        /// The rule that failed.
        defect: BarDefect,
    },

    /// Observation is older than the newest known bar.
    #[error("Stale observation at {time}, last bar at {last}")]
    StaleObservation {
        /// Observation time in epoch seconds.
        time: i64,
        /// Newest known bar time in epoch seconds.
        last: i64,
    },

    /// Resolution has no entry in the configuration table.
    #[error("Unconfigured resolution: {0}")]
    UnconfiguredResolution(String),

    /// Renko brick size outside the accepted range.
    #[error("Invalid brick size: {0}")]
    InvalidBrickSize(f64),

    /// Historical data could not be retrieved.
    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    /// Live subscription failed.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// Invalid history window.
    #[error(transparent)]
    HistoryWindow(#[from] HistoryWindowError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BarstreamError {
    /// Returns true if the error only drops a single observation.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedTimestamp(_)
                | Self::InvalidBar { .. }
                | Self::StaleObservation { .. }
                | Self::UnconfiguredResolution(_)
        )
    }
}

/// Structural rule violated by a candidate bar.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarDefect {
    /// A numeric field is NaN or infinite.
    #[error("{0} is not finite")]
    NonFinite(&'static str),
    /// Time is zero or negative.
    #[error("time is not positive")]
    NonPositiveTime,
    /// High below low.
    #[error("high < low")]
    HighBelowLow,
    /// High below open.
    #[error("high < open")]
    HighBelowOpen,
    /// High below close.
    #[error("high < close")]
    HighBelowClose,
    /// Low above open.
    #[error("low > open")]
    LowAboveOpen,
    /// Low above close.
    #[error("low > close")]
    LowAboveClose,
    /// Volume is negative.
    #[error("volume is negative")]
    NegativeVolume,
}

/// Error for invalid history windows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryWindowError {
    /// Window start is after its end.
    #[error("Invalid history window: {from} > {to}")]
    InvalidWindow {
        /// The window start.
        from: DateTime<Utc>,
        /// The window end.
        to: DateTime<Utc>,
    },
}
