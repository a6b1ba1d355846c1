//! Display mode selection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the raw bar series is presented to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Raw OHLCV candles.
    #[default]
    Candlestick,
    /// Heikin-Ashi smoothed candles.
    HeikinAshi,
    /// Renko brick ladder.
    Renko,
}

impl DisplayMode {
    /// Returns the mode as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Candlestick => "candlestick",
            Self::HeikinAshi => "heikin-ashi",
            Self::Renko => "renko",
        }
    }

    /// Returns all display modes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Candlestick, Self::HeikinAshi, Self::Renko]
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = DisplayModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "candlestick" | "candles" | "candle" => Ok(Self::Candlestick),
            "heikin-ashi" | "heikinashi" | "heikenashi" | "ha" => Ok(Self::HeikinAshi),
            "renko" => Ok(Self::Renko),
            _ => Err(DisplayModeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid display mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModeParseError(String);

impl std::fmt::Display for DisplayModeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid display mode '{}', expected one of: candlestick, heikin-ashi, renko",
            self.0
        )
    }
}

impl std::error::Error for DisplayModeParseError {}
