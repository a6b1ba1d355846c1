//! Tick-count bar aggregation.

use barstream_types::{Bar, BarDefect, BarstreamError, Resolution, Tick};
use tracing::debug;

/// Seconds without a tick after which the open bar is flushed.
pub const DEFAULT_IDLE_FLUSH_SECS: i64 = 30;

/// Ticks folded into one bar when the resolution is not tick-based.
const NON_TICK_THRESHOLD: u32 = 10;

/// Returns the bar-forming tick threshold for a resolution.
///
/// The threshold is a fraction of the resolution's tick target so bars
/// form faster than literal counting: 100 → 5, 500 → 15, 1000 → 25,
/// 5000 → 50, otherwise `target / 20` clamped to `5..=50`.
#[must_use]
pub const fn ticks_per_bar(resolution: Resolution) -> u32 {
    match resolution {
        Resolution::Ticks(100) => 5,
        Resolution::Ticks(500) => 15,
        Resolution::Ticks(1000) => 25,
        Resolution::Ticks(5000) => 50,
        Resolution::Ticks(target) => {
            let scaled = target / 20;
            if scaled < 5 {
                5
            } else if scaled > 50 {
                50
            } else {
                scaled
            }
        }
        _ => NON_TICK_THRESHOLD,
    }
}

/// Configuration for [`TickAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickAggregatorConfig {
    /// Ticks per finished bar.
    pub ticks_per_bar: u32,
    /// Idle gap in seconds that flushes the open bar.
    pub idle_flush_secs: i64,
}

impl TickAggregatorConfig {
    /// Creates a config with an explicit threshold and the default idle gap.
    #[must_use]
    pub const fn new(ticks_per_bar: u32) -> Self {
        Self {
            ticks_per_bar,
            idle_flush_secs: DEFAULT_IDLE_FLUSH_SECS,
        }
    }

    /// Creates a config with the threshold for `resolution`.
    #[must_use]
    pub const fn for_resolution(resolution: Resolution) -> Self {
        Self::new(ticks_per_bar(resolution))
    }

    /// Sets the idle flush gap.
    #[must_use]
    pub const fn with_idle_flush_secs(mut self, secs: i64) -> Self {
        self.idle_flush_secs = secs;
        self
    }
}

/// Result of folding one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStep {
    /// Snapshot of the bar the tick was folded into.
    pub bar: Bar,
    /// True if this tick filled the bar and it is now final.
    pub complete: bool,
    /// A bar finalized by the idle gap before this tick was folded.
    pub flushed: Option<Bar>,
}

/// Streaming tick-count aggregator.
///
/// A bar closes as soon as it holds `ticks_per_bar` ticks, or when the next
/// tick arrives more than `idle_flush_secs` after the previous one. Bar
/// times are strictly increasing: a new bar takes the later of its first
/// tick's time and the previous bar time plus one.
#[derive(Debug)]
pub struct TickAggregator {
    config: TickAggregatorConfig,
    current: Option<BarBuilder>,
    last_bar_time: Option<i64>,
}

impl TickAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new(config: TickAggregatorConfig) -> Self {
        Self {
            config,
            current: None,
            last_bar_time: None,
        }
    }

    /// Creates an aggregator for a resolution.
    #[must_use]
    pub const fn for_resolution(resolution: Resolution) -> Self {
        Self::new(TickAggregatorConfig::for_resolution(resolution))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> TickAggregatorConfig {
        self.config
    }

    /// Returns the time of the last finalized bar.
    #[must_use]
    pub const fn last_bar_time(&self) -> Option<i64> {
        self.last_bar_time
    }

    /// Returns a snapshot of the open bar, if any.
    #[must_use]
    pub fn current(&self) -> Option<Bar> {
        self.current.as_ref().map(BarBuilder::snapshot)
    }

    /// Continues bar numbering after a historical load.
    pub const fn seed_last_bar_time(&mut self, time: i64) {
        self.last_bar_time = Some(time);
    }

    /// Drops the open bar and all numbering state.
    pub fn reset(&mut self) {
        self.current = None;
        self.last_bar_time = None;
    }

    /// Folds one tick.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::InvalidBar`] for a non-finite price and
    /// [`BarstreamError::StaleObservation`] for a tick older than the
    /// previous one in the open bar. State is unchanged on error.
    pub fn on_tick(&mut self, tick: Tick) -> Result<TickStep, BarstreamError> {
        if !tick.price.is_finite() {
            return Err(BarstreamError::InvalidBar {
                time: tick.time,
                defect: BarDefect::NonFinite("price"),
            });
        }
        if let Some(current) = &self.current
            && tick.time < current.last_tick_time
        {
            return Err(BarstreamError::StaleObservation {
                time: tick.time,
                last: current.last_tick_time,
            });
        }

        let flushed = match self.current.take() {
            Some(builder) if tick.time - builder.last_tick_time > self.config.idle_flush_secs => {
                let bar = builder.snapshot();
                debug!(time = bar.time, ticks = builder.tick_count, "idle flush");
                self.last_bar_time = Some(bar.time);
                Some(bar)
            }
            other => {
                self.current = other;
                None
            }
        };

        let start = self.next_bar_time(tick.time);
        let builder = self
            .current
            .get_or_insert_with(|| BarBuilder::new(start, tick.price));
        builder.update(tick);

        let bar = builder.snapshot();
        let complete = builder.tick_count >= self.config.ticks_per_bar;
        if complete {
            debug!(time = bar.time, close = bar.close, volume = bar.volume, "tick bar complete");
            self.current = None;
            self.last_bar_time = Some(bar.time);
        }

        Ok(TickStep {
            bar,
            complete,
            flushed,
        })
    }

    /// Finalizes and returns the open bar, if any.
    pub fn flush(&mut self) -> Option<Bar> {
        let bar = self.current.take()?.snapshot();
        self.last_bar_time = Some(bar.time);
        Some(bar)
    }

    fn next_bar_time(&self, tick_time: i64) -> i64 {
        self.last_bar_time
            .map_or(tick_time, |last| tick_time.max(last + 1))
    }
}

/// Accumulator for the bar being built.
#[derive(Debug)]
struct BarBuilder {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    tick_count: u32,
    last_tick_time: i64,
}

impl BarBuilder {
    /// Seeds every price with the first tick and zero volume.
    const fn new(time: i64, price: f64) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0,
            tick_count: 0,
            last_tick_time: time,
        }
    }

    fn update(&mut self, tick: Tick) {
        self.high = self.high.max(tick.price);
        self.low = self.low.min(tick.price);
        self.close = tick.price;
        self.volume = self.volume.saturating_add(tick.volume);
        self.tick_count += 1;
        self.last_tick_time = tick.time;
    }

    const fn snapshot(&self) -> Bar {
        Bar::new(
            self.time,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}
