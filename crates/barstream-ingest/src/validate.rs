//! Structural bar validation.

use barstream_types::{Bar, BarDefect, BarstreamError};

/// Returns the first structural rule the bar violates, if any.
///
/// Rules are checked in a fixed order: finiteness of every price, a
/// positive time, then `high >= low`, `high >= open`, `high >= close`,
/// `low <= open` and `low <= close`.
pub fn check_bar(bar: &Bar) -> Result<(), BarDefect> {
    for (field, value) in [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ] {
        if !value.is_finite() {
            return Err(BarDefect::NonFinite(field));
        }
    }
    if bar.time <= 0 {
        return Err(BarDefect::NonPositiveTime);
    }
    if bar.high < bar.low {
        return Err(BarDefect::HighBelowLow);
    }
    if bar.high < bar.open {
        return Err(BarDefect::HighBelowOpen);
    }
    if bar.high < bar.close {
        return Err(BarDefect::HighBelowClose);
    }
    if bar.low > bar.open {
        return Err(BarDefect::LowAboveOpen);
    }
    if bar.low > bar.close {
        return Err(BarDefect::LowAboveClose);
    }
    Ok(())
}

/// Accepts a bar iff it satisfies every structural rule.
///
/// # Errors
///
/// Returns [`BarstreamError::InvalidBar`] naming the first violated rule.
pub fn validate_bar(bar: Bar) -> Result<Bar, BarstreamError> {
    check_bar(&bar)
        .map(|()| bar)
        .map_err(|defect| BarstreamError::InvalidBar {
            time: bar.time,
            defect,
        })
}
