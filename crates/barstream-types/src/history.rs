//! Historical data request window.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{HistoryWindowError, Resolution};

/// Default lookback used when requesting history for a resolution.
pub const DEFAULT_LOOKBACK: TimeDelta = TimeDelta::days(7);

/// A request for historical bars sent to the data-source collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Instrument symbol.
    pub symbol: String,
    /// Requested resolution.
    pub resolution: Resolution,
    /// Maximum number of bars to return, counted back from `to`.
    pub countback: u32,
    /// Window start (inclusive).
    pub from: DateTime<Utc>,
    /// Window end (inclusive).
    pub to: DateTime<Utc>,
}

impl HistoryRequest {
    /// Creates a new request, validating that from <= to.
    ///
    /// # Errors
    ///
    /// Returns an error if from > to.
    pub fn new(
        symbol: impl Into<String>,
        resolution: Resolution,
        countback: u32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Self, HistoryWindowError> {
        if from > to {
            return Err(HistoryWindowError::InvalidWindow { from, to });
        }
        Ok(Self {
            symbol: symbol.into(),
            resolution,
            countback,
            from,
            to,
        })
    }

    /// Creates a request covering `lookback` before `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookback is negative.
    pub fn lookback(
        symbol: impl Into<String>,
        resolution: Resolution,
        countback: u32,
        to: DateTime<Utc>,
        lookback: TimeDelta,
    ) -> Result<Self, HistoryWindowError> {
        Self::new(symbol, resolution, countback, to - lookback, to)
    }

    /// Returns the window start in epoch seconds.
    #[must_use]
    pub fn from_epoch(&self) -> i64 {
        self.from.timestamp()
    }

    /// Returns the window end in epoch seconds.
    #[must_use]
    pub fn to_epoch(&self) -> i64 {
        self.to.timestamp()
    }

    /// Returns true if the window contains the given epoch second.
    #[must_use]
    pub fn contains(&self, time: i64) -> bool {
        time >= self.from_epoch() && time <= self.to_epoch()
    }
}

impl std::fmt::Display for HistoryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} x{} ({} to {})",
            self.symbol, self.resolution, self.countback, self.from, self.to
        )
    }
}
