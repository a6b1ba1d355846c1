//! Chart resolution identifiers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Bar resolution, parsed from identifiers such as `500T`, `30S`, `15` or `1D`.
///
/// Bare numbers are minutes. Tick resolutions carry a tick-count target
/// rather than a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    /// Tick-count bars (`<N>T`).
    Ticks(u32),
    /// Second bars (`<N>S`).
    Seconds(u32),
    /// Minute bars (`<N>`).
    Minutes(u32),
    /// Daily bars (`<N>D`).
    Days(u32),
    /// Weekly bars (`<N>W`).
    Weeks(u32),
    /// Monthly bars (`<N>M`).
    Months(u32),
}

impl Resolution {
    /// Returns true if bars are formed by tick count.
    #[must_use]
    pub const fn is_tick(&self) -> bool {
        matches!(self, Self::Ticks(_))
    }

    /// Returns the tick-count target for tick resolutions.
    #[must_use]
    pub const fn tick_target(&self) -> Option<u32> {
        match self {
            Self::Ticks(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the nominal bar duration in seconds, or None for tick bars.
    ///
    /// Months are counted as 30 days.
    #[must_use]
    pub const fn seconds(&self) -> Option<u64> {
        match self {
            Self::Ticks(_) => None,
            Self::Seconds(n) => Some(*n as u64),
            Self::Minutes(n) => Some(*n as u64 * 60),
            Self::Days(n) => Some(*n as u64 * 86_400),
            Self::Weeks(n) => Some(*n as u64 * 604_800),
            Self::Months(n) => Some(*n as u64 * 2_592_000),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ticks(n) => write!(f, "{n}T"),
            Self::Seconds(n) => write!(f, "{n}S"),
            Self::Minutes(n) => write!(f, "{n}"),
            Self::Days(n) => write!(f, "{n}D"),
            Self::Weeks(n) => write!(f, "{n}W"),
            Self::Months(n) => write!(f, "{n}M"),
        }
    }
}

impl FromStr for Resolution {
    type Err = ResolutionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split);

        let count: u32 = digits
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ResolutionParseError(s.to_string()))?;

        match unit {
            "" => Ok(Self::Minutes(count)),
            "T" | "t" => Ok(Self::Ticks(count)),
            "S" | "s" => Ok(Self::Seconds(count)),
            "D" | "d" => Ok(Self::Days(count)),
            "W" | "w" => Ok(Self::Weeks(count)),
            "M" => Ok(Self::Months(count)),
            _ => Err(ResolutionParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid resolution string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionParseError(String);

impl std::fmt::Display for ResolutionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid resolution '{}', expected <N>T, <N>S, <N>, <N>D, <N>W or <N>M",
            self.0
        )
    }
}

impl std::error::Error for ResolutionParseError {}
