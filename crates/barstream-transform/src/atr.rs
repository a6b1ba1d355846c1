//! Average true range and ATR-derived brick sizing.

use barstream_types::Bar;

/// Trailing window of true ranges averaged.
pub const ATR_PERIOD: usize = 14;

/// ATR assumed when the history is too short to compute one.
pub const DEFAULT_ATR: f64 = 50.0;

const BRICK_FACTOR: f64 = 0.5;

/// True range of a bar against the previous close.
#[must_use]
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Simple average of the last `period` true ranges.
///
/// Returns `None` when fewer than `period` true ranges exist (each needs a
/// predecessor, so `period + 1` bars are required).
#[must_use]
pub fn average_true_range(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let ranges: Vec<f64> = bars
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .collect();
    let window = ranges.get(ranges.len().checked_sub(period)?..)?;
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Brick size from `round(ATR * 0.5)`, at least one.
#[must_use]
pub fn atr_brick_size(bars: &[Bar]) -> f64 {
    let atr = average_true_range(bars, ATR_PERIOD).unwrap_or(DEFAULT_ATR);
    (atr * BRICK_FACTOR).round().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize, range: f64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let mid = 100.0 + i as f64;
                Bar::new(60 * (i as i64 + 1), mid, mid + range / 2.0, mid - range / 2.0, mid, 1)
            })
            .collect()
    }

    #[test]
    fn test_true_range_uses_gap() {
        let bar = Bar::new(60, 110.0, 112.0, 109.0, 111.0, 1);
        assert_relative_eq!(true_range(&bar, 100.0), 12.0);
        assert_relative_eq!(true_range(&bar, 110.0), 3.0);
        assert_relative_eq!(true_range(&bar, 120.0), 11.0);
    }

    #[test]
    fn test_short_history_defaults() {
        assert_eq!(average_true_range(&ramp(14, 4.0), ATR_PERIOD), None);
        assert_relative_eq!(atr_brick_size(&ramp(5, 4.0)), 25.0);
        assert_relative_eq!(atr_brick_size(&[]), 25.0);
    }

    #[test]
    fn test_atr_over_trailing_window() {
        // Each true range is max(4, 3, 1) = 4.
        let bars = ramp(20, 4.0);
        assert_relative_eq!(average_true_range(&bars, ATR_PERIOD).unwrap(), 4.0);
        assert_relative_eq!(atr_brick_size(&bars), 2.0);
    }

    #[test]
    fn test_brick_size_floor() {
        let bars = ramp(20, 0.2);
        // True ranges are 1.1 from the one-point drift, halved and rounded to 1.
        assert_relative_eq!(atr_brick_size(&bars), 1.0);
    }
}
