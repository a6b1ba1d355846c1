//! OHLCV bar, tick and overlay point representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar (candlestick) data.
///
/// Times are whole epoch seconds. A bar that passed validation satisfies
/// `low <= open, close <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time in epoch seconds.
    pub time: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: u64,
}

impl Bar {
    /// Creates a new OHLCV bar.
    #[must_use]
    pub const fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Creates a flat bar where every price equals `price`.
    #[must_use]
    pub const fn flat(time: i64, price: f64, volume: u64) -> Self {
        Self::new(time, price, price, price, price, volume)
    }

    /// Returns the bar time as a UTC datetime, if representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns true if this is a bullish (green) bar.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns the close price as an overlay point.
    #[must_use]
    pub const fn close_point(&self) -> LinePoint {
        LinePoint::new(self.time, self.close)
    }
}

/// A validated live bar observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The observed bar values.
    pub bar: Bar,
    /// Whether the upstream source flagged the bar as complete.
    pub closed: bool,
}

impl Observation {
    /// Creates a new observation.
    #[must_use]
    pub const fn new(bar: Bar, closed: bool) -> Self {
        Self { bar, closed }
    }

    /// Returns the observation time in epoch seconds.
    #[must_use]
    pub const fn time(&self) -> i64 {
        self.bar.time
    }
}

/// A single trade or quote observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Observation time in epoch seconds.
    pub time: i64,
    /// Traded price.
    pub price: f64,
    /// Traded volume.
    pub volume: u64,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub const fn new(time: i64, price: f64, volume: u64) -> Self {
        Self {
            time,
            price,
            volume,
        }
    }
}

/// A `{time, value}` point for derived line overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    /// Point time in epoch seconds.
    pub time: i64,
    /// Overlay value.
    pub value: f64,
}

impl LinePoint {
    /// Creates a new line point.
    #[must_use]
    pub const fn new(time: i64, value: f64) -> Self {
        Self { time, value }
    }
}
