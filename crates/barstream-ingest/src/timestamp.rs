//! Timestamp unit inference.
//!
//! Feeds deliver times as epoch seconds, milliseconds, microseconds or
//! nanoseconds, sometimes as ISO-8601 text. Normalization infers the unit
//! from magnitude and always yields whole epoch seconds.

use barstream_types::BarstreamError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 2000-01-01T00:00:00Z in epoch seconds.
pub const YEAR_2000_SECS: i64 = 946_684_800;

/// 2100-01-01T00:00:00Z in epoch seconds (exclusive upper bound).
pub const YEAR_2100_SECS: i64 = 4_102_444_800;

/// Millisecond values above this (roughly May 2033) are treated as one
/// unit too fine.
pub const YEAR_2033_MILLIS: i128 = 2_000_000_000_000;

const YEAR_2000_MILLIS: i128 = YEAR_2000_SECS as i128 * 1_000;
const YEAR_2100_MILLIS: i128 = YEAR_2100_SECS as i128 * 1_000;

/// Values above 1e16 (17+ digits) are nanoseconds.
const NANOS_FLOOR: i128 = 10_000_000_000_000_000;

/// Values above 1e14 (15-16 digits) are microseconds.
const MICROS_FLOOR: i128 = 100_000_000_000_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A timestamp as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Integer epoch value of unknown unit.
    Integer(i64),
    /// Fractional epoch value of unknown unit.
    Float(f64),
    /// ISO-8601 text or a numeric string.
    Text(String),
}

impl RawTimestamp {
    /// Returns true if the value is present and strictly positive.
    ///
    /// Text is considered positive unless it is empty or parses to a
    /// non-positive number.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Integer(v) => *v > 0,
            Self::Float(v) => *v > 0.0,
            Self::Text(s) => {
                let s = s.trim();
                !s.is_empty() && !matches!(s.parse::<f64>(), Ok(v) if v <= 0.0)
            }
        }
    }

    /// Normalizes to whole epoch seconds.
    ///
    /// # Errors
    ///
    /// See [`normalize_timestamp`].
    pub fn normalize(&self) -> Result<i64, BarstreamError> {
        normalize_timestamp(self)
    }
}

impl From<i64> for RawTimestamp {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Converts a raw timestamp of unknown unit to whole epoch seconds.
///
/// Text is parsed first (RFC 3339, then naive ISO-8601 read as UTC, then a
/// plain number). Numeric values are then scaled by magnitude:
///
/// 1. above 1e16: nanoseconds, divide by 1e6
/// 2. above 1e14: microseconds, divide by 1e3
/// 3. within the year-2000..2100 range read as seconds: multiply by 1e3
/// 4. if still implausible and above the year-2033 millisecond mark,
///    divide by 1e3 once more
///
/// and finally floored to seconds.
///
/// # Errors
///
/// Returns [`BarstreamError::MalformedTimestamp`] for unparseable text,
/// non-finite numbers, or results outside `[2000-01-01, 2100-01-01)`.
pub fn normalize_timestamp(raw: &RawTimestamp) -> Result<i64, BarstreamError> {
    let value = match raw {
        RawTimestamp::Integer(v) => i128::from(*v),
        RawTimestamp::Float(v) => float_to_i128(*v, raw)?,
        RawTimestamp::Text(s) => parse_text(s, raw)?,
    };
    let millis = to_millis(value);
    let secs = millis.div_euclid(1_000);

    i64::try_from(secs)
        .ok()
        .filter(|secs| (YEAR_2000_SECS..YEAR_2100_SECS).contains(secs))
        .ok_or_else(|| malformed(raw))
}

fn is_plausible_millis(value: i128) -> bool {
    (YEAR_2000_MILLIS..YEAR_2100_MILLIS).contains(&value)
}

fn to_millis(value: i128) -> i128 {
    if is_plausible_millis(value) {
        return value;
    }

    let scaled = if value > NANOS_FLOOR {
        value.div_euclid(1_000_000)
    } else if value > MICROS_FLOOR {
        value.div_euclid(1_000)
    } else if (i128::from(YEAR_2000_SECS)..YEAR_2000_MILLIS).contains(&value) {
        value * 1_000
    } else {
        value
    };

    if !is_plausible_millis(scaled) && scaled > YEAR_2033_MILLIS {
        scaled.div_euclid(1_000)
    } else {
        scaled
    }
}

fn float_to_i128(value: f64, raw: &RawTimestamp) -> Result<i128, BarstreamError> {
    if !value.is_finite() {
        return Err(malformed(raw));
    }
    // Saturating cast; absurd magnitudes fail the range check later.
    Ok(value.floor() as i128)
}

fn parse_text(text: &str, raw: &RawTimestamp) -> Result<i128, BarstreamError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(i128::from(dt.timestamp_millis()));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(i128::from(dt.and_utc().timestamp_millis()));
        }
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(i128::from(v));
    }
    if let Ok(v) = text.parse::<f64>() {
        return float_to_i128(v, raw);
    }
    Err(malformed(raw))
}

fn malformed(raw: &RawTimestamp) -> BarstreamError {
    let shown = match raw {
        RawTimestamp::Integer(v) => v.to_string(),
        RawTimestamp::Float(v) => v.to_string(),
        RawTimestamp::Text(s) => format!("{s:?}"),
    };
    BarstreamError::MalformedTimestamp(shown)
}
