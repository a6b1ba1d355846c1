//! Wire payload decoding.
//!
//! Live pushes and historical responses share one loose shape: any of
//! several timestamp fields, short or long price keys, numbers that may
//! arrive as strings, and four competing volume fields.

use barstream_types::{Bar, BarDefect, BarstreamError, Observation, Tick};
use serde::{Deserialize, Serialize};

use crate::timestamp::RawTimestamp;
use crate::validate::validate_bar;

/// A number that may arrive as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// A JSON number.
    Number(f64),
    /// A JSON string holding a number.
    Text(String),
}

impl RawNumber {
    /// Returns the numeric value, NaN if the text does not parse.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// An undecoded bar or tick as delivered by a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    /// Epoch time, preferred when strictly positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_unix: Option<RawTimestamp>,
    /// Usually ISO-8601 text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    /// Short epoch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<RawTimestamp>,
    /// Long epoch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<RawTimestamp>,

    /// Opening price.
    #[serde(default, alias = "o", skip_serializing_if = "Option::is_none")]
    pub open: Option<RawNumber>,
    /// Highest price.
    #[serde(default, alias = "h", skip_serializing_if = "Option::is_none")]
    pub high: Option<RawNumber>,
    /// Lowest price.
    #[serde(default, alias = "l", skip_serializing_if = "Option::is_none")]
    pub low: Option<RawNumber>,
    /// Closing or last traded price.
    #[serde(
        default,
        alias = "c",
        alias = "price",
        skip_serializing_if = "Option::is_none"
    )]
    pub close: Option<RawNumber>,

    /// Volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<RawNumber>,
    /// Tick volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_volume: Option<RawNumber>,
    /// Short volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<RawNumber>,
    /// Short tick volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv: Option<RawNumber>,

    /// Upstream completion flag.
    #[serde(default, alias = "closed", skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

impl RawObservation {
    /// Creates an observation with epoch time and OHLC prices.
    #[must_use]
    pub fn ohlc(time: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time: Some(RawTimestamp::Integer(time)),
            open: Some(open.into()),
            high: Some(high.into()),
            low: Some(low.into()),
            close: Some(close.into()),
            ..Self::default()
        }
    }

    /// Creates a tick observation with epoch time and a single price.
    #[must_use]
    pub fn tick(time: i64, price: f64) -> Self {
        Self {
            time: Some(RawTimestamp::Integer(time)),
            close: Some(price.into()),
            ..Self::default()
        }
    }

    /// Sets the volume.
    #[must_use]
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume.into());
        self
    }

    /// Sets the upstream completion flag.
    #[must_use]
    pub const fn with_closed(mut self, closed: bool) -> Self {
        self.is_closed = Some(closed);
        self
    }

    /// Returns the timestamp field to decode, by precedence.
    ///
    /// `timestampUnix` wins when positive, then a textual `timestamp`,
    /// then `t`, then `time`, then a numeric `timestamp`.
    #[must_use]
    pub fn raw_time(&self) -> Option<&RawTimestamp> {
        self.timestamp_unix
            .as_ref()
            .filter(|ts| ts.is_positive())
            .or_else(|| {
                self.timestamp
                    .as_ref()
                    .filter(|ts| matches!(ts, RawTimestamp::Text(_)))
            })
            .or(self.t.as_ref())
            .or(self.time.as_ref())
            .or(self.timestamp.as_ref())
    }

    /// Decodes the timestamp to whole epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::MalformedTimestamp`] if no timestamp field
    /// is present or the value cannot be normalized.
    pub fn epoch_seconds(&self) -> Result<i64, BarstreamError> {
        self.raw_time()
            .ok_or_else(|| BarstreamError::MalformedTimestamp("missing".to_string()))?
            .normalize()
    }

    /// Returns the first non-zero volume field, or zero.
    ///
    /// # Errors
    ///
    /// Returns [`BarDefect::NegativeVolume`] if the chosen value is negative.
    pub fn resolved_volume(&self) -> Result<u64, BarDefect> {
        let chosen = [&self.volume, &self.tick_volume, &self.v, &self.tv]
            .into_iter()
            .flatten()
            .map(RawNumber::value)
            .find(|v| *v != 0.0 && !v.is_nan());

        match chosen {
            None => Ok(0),
            Some(v) if v < 0.0 => Err(BarDefect::NegativeVolume),
            // Float-to-int casts saturate; fractional volume floors.
            Some(v) => Ok(v.floor() as u64),
        }
    }

    fn price(field: Option<&RawNumber>) -> f64 {
        field.map_or(f64::NAN, RawNumber::value)
    }

    fn has_full_ohlc(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some()
    }

    /// Decodes and validates a bar observation.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::MalformedTimestamp`] or
    /// [`BarstreamError::InvalidBar`] when the payload is unusable.
    pub fn to_observation(&self) -> Result<Observation, BarstreamError> {
        let time = self.epoch_seconds()?;
        let volume = self
            .resolved_volume()
            .map_err(|defect| BarstreamError::InvalidBar { time, defect })?;
        let bar = Bar::new(
            time,
            Self::price(self.open.as_ref()),
            Self::price(self.high.as_ref()),
            Self::price(self.low.as_ref()),
            Self::price(self.close.as_ref()),
            volume,
        );
        let bar = validate_bar(bar)?;
        Ok(Observation::new(bar, self.is_closed.unwrap_or(false)))
    }

    /// Decodes a tick for tick-count aggregation.
    ///
    /// Only a time and a close price are required; volume defaults to one.
    /// When the payload also carries full OHLC it must pass bar validation.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::MalformedTimestamp`] or
    /// [`BarstreamError::InvalidBar`] when the payload is unusable.
    pub fn to_tick(&self) -> Result<Tick, BarstreamError> {
        if self.has_full_ohlc() {
            let observation = self.to_observation()?;
            let bar = observation.bar;
            return Ok(Tick::new(bar.time, bar.close, bar.volume.max(1)));
        }

        let time = self.epoch_seconds()?;
        let price = Self::price(self.close.as_ref());
        if !price.is_finite() {
            return Err(BarstreamError::InvalidBar {
                time,
                defect: BarDefect::NonFinite("price"),
            });
        }
        let volume = self
            .resolved_volume()
            .map_err(|defect| BarstreamError::InvalidBar { time, defect })?;
        Ok(Tick::new(time, price, volume.max(1)))
    }
}

/// A historical response body.
///
/// Either a bare array of bars or an object wrapping it under `data` or
/// `bars`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HistoryResponse {
    /// A bare array.
    Bars(Vec<RawObservation>),
    /// An object wrapper.
    Wrapped {
        /// The wrapped bars.
        #[serde(alias = "bars")]
        data: Vec<RawObservation>,
    },
}

impl HistoryResponse {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::Json`] if the body matches neither shape.
    pub fn from_json(body: &str) -> Result<Self, BarstreamError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Returns the raw bars.
    #[must_use]
    pub fn into_bars(self) -> Vec<RawObservation> {
        match self {
            Self::Bars(bars) | Self::Wrapped { data: bars } => bars,
        }
    }
}
