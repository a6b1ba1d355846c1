//! Synthetic series generators for barstream benchmarks.

use barstream_lib::{Bar, RawObservation};

/// Start of every generated series, in epoch seconds.
pub const START: i64 = 1_700_000_000;

/// Deterministic zig-zag price path with a slow upward drift.
///
/// Swings are wide enough that both Renko directions are exercised.
pub fn price_path(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let i = i as f64;
            20_000.0 + i * 0.05 + (i / 37.0).sin() * 60.0 + (i / 5.0).cos() * 4.0
        })
        .collect()
}

/// One-minute bars built from [`price_path`].
pub fn minute_bars(len: usize) -> Vec<Bar> {
    let closes = price_path(len + 1);
    closes
        .windows(2)
        .zip(0_i64..)
        .map(|(pair, i)| {
            let (open, close) = (pair[0], pair[1]);
            let high = open.max(close) + 1.5;
            let low = open.min(close) - 1.5;
            Bar::new(START + 60 * i, open, high, low, close, 100 + (i as u64 % 50))
        })
        .collect()
}

/// Raw observations for [`minute_bars`], with some duplicated times.
pub fn raw_history(len: usize) -> Vec<RawObservation> {
    minute_bars(len)
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let time = if i % 10 == 9 { bar.time - 60 } else { bar.time };
            RawObservation::ohlc(time, bar.open, bar.high, bar.low, bar.close)
                .with_volume(bar.volume as f64)
        })
        .collect()
}

/// Tick pushes a few per second along [`price_path`].
pub fn tick_pushes(len: usize) -> Vec<RawObservation> {
    price_path(len)
        .into_iter()
        .zip(0_i64..)
        .map(|(price, i)| RawObservation::tick(START + i / 4, price))
        .collect()
}
