//! Per-series orchestration of ingestion, bar formation and display transforms.

use barstream_aggregate::{
    BarMerger, DEFAULT_IDLE_FLUSH_SECS, MergeOutcome, TickAggregator, TickAggregatorConfig,
};
use barstream_ingest::{HistoricalBatch, RawObservation, prepare_history};
use barstream_transform::{
    BrickSizing, DEFAULT_BRICK_SIZE, HeikinAshi, RenkoBrick, RenkoConfig, RenkoEngine,
    RenkoLadderState,
};
use barstream_types::{Bar, BarstreamError, DisplayMode, LinePoint, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Largest accepted fixed brick size.
pub const MAX_BRICK_SIZE: f64 = 1_000.0;

/// Configuration for a [`SeriesCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Initial display mode.
    pub display_mode: DisplayMode,
    /// Renko sizing and rounding.
    pub renko: RenkoConfig,
    /// Idle gap that flushes an open tick bar.
    pub idle_flush_secs: i64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Candlestick,
            renko: RenkoConfig::new(BrickSizing::Fixed(DEFAULT_BRICK_SIZE)),
            idle_flush_secs: DEFAULT_IDLE_FLUSH_SECS,
        }
    }
}

impl SeriesConfig {
    /// Sets the display mode.
    #[must_use]
    pub const fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    /// Sets the Renko configuration.
    #[must_use]
    pub const fn with_renko(mut self, renko: RenkoConfig) -> Self {
        self.renko = renko;
        self
    }
}

/// Checks that a brick sizing is usable.
///
/// # Errors
///
/// Returns [`BarstreamError::InvalidBrickSize`] unless a fixed size is in
/// `(0, 1000]`.
pub fn validate_brick_sizing(sizing: BrickSizing) -> Result<BrickSizing, BarstreamError> {
    match sizing {
        BrickSizing::Fixed(size) if !(size > 0.0 && size <= MAX_BRICK_SIZE) => {
            Err(BarstreamError::InvalidBrickSize(size))
        }
        other => Ok(other),
    }
}

/// A fully derived series for the renderer to replace its contents with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "kebab-case")]
pub enum DisplaySeries {
    /// Raw bars.
    Candles(Vec<Bar>),
    /// Heikin-Ashi candles.
    HeikinAshi(Vec<Bar>),
    /// Renko bricks.
    Renko(Vec<RenkoBrick>),
}

impl DisplaySeries {
    /// Returns the display mode this series was derived for.
    #[must_use]
    pub const fn mode(&self) -> DisplayMode {
        match self {
            Self::Candles(_) => DisplayMode::Candlestick,
            Self::HeikinAshi(_) => DisplayMode::HeikinAshi,
            Self::Renko(_) => DisplayMode::Renko,
        }
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Candles(bars) | Self::HeikinAshi(bars) => bars.len(),
            Self::Renko(bricks) => bricks.len(),
        }
    }

    /// Returns true if the series has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every point as a plain bar.
    #[must_use]
    pub fn bars(&self) -> Vec<Bar> {
        match self {
            Self::Candles(bars) | Self::HeikinAshi(bars) => bars.clone(),
            Self::Renko(bricks) => bricks.iter().map(RenkoBrick::as_bar).collect(),
        }
    }

    /// Returns a close-price overlay line.
    #[must_use]
    pub fn close_line(&self) -> Vec<LinePoint> {
        self.bars().iter().map(Bar::close_point).collect()
    }
}

/// An incremental change to the displayed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum DisplayDelta {
    /// Replace the point at this time, or append it.
    Upsert(Bar),
    /// Append these bricks.
    Bricks(Vec<RenkoBrick>),
    /// Nothing to redraw.
    Unchanged,
}

/// Owns all state for one resolution and display mode.
///
/// Historical batches replace everything; live observations are routed to
/// the tick aggregator or the bar merger, then through the active display
/// transform. Committed raw bars and the open bar are retained so
/// display-mode and brick-size changes re-derive without refetching.
#[derive(Debug)]
pub struct SeriesCoordinator {
    resolution: Resolution,
    config: SeriesConfig,
    history: Vec<Bar>,
    live: Option<Bar>,
    merger: BarMerger,
    ticks: TickAggregator,
    heikin_ashi: HeikinAshi,
    renko: RenkoEngine,
}

impl SeriesCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new(resolution: Resolution, config: SeriesConfig) -> Self {
        Self {
            resolution,
            config,
            history: Vec::new(),
            live: None,
            merger: BarMerger::new(),
            ticks: Self::tick_aggregator(resolution, &config),
            heikin_ashi: HeikinAshi::new(),
            renko: RenkoEngine::new(config.renko),
        }
    }

    fn tick_aggregator(resolution: Resolution, config: &SeriesConfig) -> TickAggregator {
        TickAggregator::new(
            TickAggregatorConfig::for_resolution(resolution)
                .with_idle_flush_secs(config.idle_flush_secs),
        )
    }

    /// Returns the active resolution.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns the active display mode.
    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.config.display_mode
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> SeriesConfig {
        self.config
    }

    /// Returns the committed raw bars.
    #[must_use]
    pub fn history(&self) -> &[Bar] {
        &self.history
    }

    /// Returns the open bar that has not been committed yet.
    #[must_use]
    pub const fn live_bar(&self) -> Option<Bar> {
        self.live
    }

    /// Returns the committed bars followed by the open bar.
    #[must_use]
    pub fn bars(&self) -> Vec<Bar> {
        self.history.iter().copied().chain(self.live).collect()
    }

    /// Returns the Renko brick size in effect.
    #[must_use]
    pub const fn brick_size(&self) -> f64 {
        self.renko.brick_size()
    }

    /// Returns the Renko ladder, if seeded.
    #[must_use]
    pub const fn renko_ladder(&self) -> Option<RenkoLadderState> {
        self.renko.ladder()
    }

    /// Replaces all state with a raw historical response.
    pub fn apply_historical_batch(&mut self, raw: &[RawObservation]) -> DisplaySeries {
        self.load_history(prepare_history(raw, self.resolution))
    }

    /// Replaces all state with an already prepared batch.
    pub fn load_history(&mut self, batch: HistoricalBatch) -> DisplaySeries {
        self.history = batch.bars;
        self.live = None;
        self.merger.reset();
        if let Some(last) = self.history.last() {
            self.merger.seed(*last);
        }
        self.reset_ticks();
        info!(
            resolution = %self.resolution,
            bars = self.history.len(),
            rejected = batch.rejected,
            repaired = batch.repaired,
            "historical batch applied"
        );
        self.derive()
    }

    /// Recomputes the displayed series from retained raw bars.
    ///
    /// Resets the active transform's state first.
    pub fn derive(&mut self) -> DisplaySeries {
        match self.config.display_mode {
            DisplayMode::Candlestick => DisplaySeries::Candles(self.bars()),
            DisplayMode::HeikinAshi => {
                let mut candles = self.heikin_ashi.convert(&self.history);
                if let Some(live) = self.live {
                    candles.push(self.heikin_ashi.update(&live, false));
                }
                DisplaySeries::HeikinAshi(candles)
            }
            DisplayMode::Renko => DisplaySeries::Renko(self.renko.convert(&self.bars())),
        }
    }

    /// Applies one live push.
    ///
    /// # Errors
    ///
    /// Returns a recoverable error ([`BarstreamError::MalformedTimestamp`],
    /// [`BarstreamError::InvalidBar`], [`BarstreamError::StaleObservation`])
    /// when the observation is dropped. State is unchanged in that case.
    pub fn apply_live_observation(
        &mut self,
        raw: &RawObservation,
    ) -> Result<DisplayDelta, BarstreamError> {
        let result = if self.resolution.is_tick() {
            self.apply_tick(raw)
        } else {
            self.apply_bar(raw)
        };
        if let Err(err) = &result {
            warn!(resolution = %self.resolution, error = %err, "live observation dropped");
        }
        result
    }

    fn apply_bar(&mut self, raw: &RawObservation) -> Result<DisplayDelta, BarstreamError> {
        let observation = raw.to_observation()?;
        let outcome = self.merger.apply(observation)?;
        match outcome {
            MergeOutcome::Committed(bar) => {
                debug!(time = bar.time, close = bar.close, "bar committed");
                self.commit(bar);
            }
            MergeOutcome::Opened { bar, superseded } => {
                if let Some(superseded) = superseded {
                    debug!(time = superseded.time, "unclosed bar dropped");
                }
                self.live = Some(bar);
            }
            MergeOutcome::Amended(bar) => self.live = Some(bar),
        }
        Ok(self.transform(outcome.bar(), outcome.is_committed()))
    }

    fn apply_tick(&mut self, raw: &RawObservation) -> Result<DisplayDelta, BarstreamError> {
        let tick = raw.to_tick()?;
        let step = self.ticks.on_tick(tick)?;
        if let Some(flushed) = step.flushed {
            // Already displayed with these values as the previous open bar.
            self.commit(flushed);
            if self.config.display_mode == DisplayMode::HeikinAshi {
                self.heikin_ashi.update(&flushed, true);
            }
        }
        if step.complete {
            self.commit(step.bar);
        } else {
            self.live = Some(step.bar);
        }
        Ok(self.transform(step.bar, step.complete))
    }

    fn commit(&mut self, bar: Bar) {
        self.live = None;
        self.upsert_history(bar);
    }

    fn upsert_history(&mut self, bar: Bar) {
        match self.history.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => self.history.push(bar),
        }
    }

    fn transform(&mut self, bar: Bar, closed: bool) -> DisplayDelta {
        match self.config.display_mode {
            DisplayMode::Candlestick => DisplayDelta::Upsert(bar),
            DisplayMode::HeikinAshi => DisplayDelta::Upsert(self.heikin_ashi.update(&bar, closed)),
            DisplayMode::Renko => {
                let bricks = if self.renko.ladder().is_some() {
                    self.renko.update(&bar)
                } else {
                    // First bar of an empty series seeds the ladder.
                    self.renko.convert(&self.bars())
                };
                if bricks.is_empty() {
                    DisplayDelta::Unchanged
                } else {
                    DisplayDelta::Bricks(bricks)
                }
            }
        }
    }

    /// Switches display mode and re-derives from retained raw bars.
    ///
    /// An open tick bar is discarded; the next tick starts a fresh bar.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> DisplaySeries {
        info!(from = %self.config.display_mode, to = %mode, "display mode changed");
        self.config.display_mode = mode;
        self.heikin_ashi.reset();
        self.renko.reset();
        self.reset_ticks();
        self.derive()
    }

    /// Clears the tick accumulator and continues numbering after history.
    fn reset_ticks(&mut self) {
        if self.resolution.is_tick()
            && let Some(open) = self.live.take()
        {
            debug!(time = open.time, volume = open.volume, "open tick bar discarded");
        }
        self.ticks.reset();
        if let Some(last) = self.history.last() {
            self.ticks.seed_last_bar_time(last.time);
        }
    }

    /// Changes Renko sizing and resets the ladder.
    ///
    /// Returns the re-derived series when Renko is displayed.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::InvalidBrickSize`] for a fixed size outside
    /// `(0, 1000]`; nothing changes in that case.
    pub fn set_brick_sizing(
        &mut self,
        sizing: BrickSizing,
    ) -> Result<Option<DisplaySeries>, BarstreamError> {
        let sizing = validate_brick_sizing(sizing)?;
        info!(%sizing, "brick size changed");
        self.config.renko.sizing = sizing;
        self.renko.set_sizing(sizing);
        Ok((self.config.display_mode == DisplayMode::Renko).then(|| self.derive()))
    }

    /// Discards every bar and all transform state for a new resolution.
    ///
    /// A fresh historical batch must follow.
    pub fn change_resolution(&mut self, resolution: Resolution) {
        info!(from = %self.resolution, to = %resolution, "resolution changed");
        self.resolution = resolution;
        self.history.clear();
        self.live = None;
        self.merger.reset();
        self.ticks = Self::tick_aggregator(resolution, &self.config);
        self.heikin_ashi.reset();
        self.renko = RenkoEngine::new(self.config.renko);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const T0: i64 = 1_700_000_000;

    fn raw_bar(time: i64, close: f64) -> RawObservation {
        RawObservation::ohlc(time, close, close + 1.0, close - 1.0, close).with_volume(10.0)
    }

    fn minute_history() -> Vec<RawObservation> {
        (0..5).map(|i| raw_bar(T0 + 60 * i, 100.0 + i as f64)).collect()
    }

    #[test]
    fn test_historical_batch_candles() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        let series = coordinator.apply_historical_batch(&minute_history());
        assert_eq!(series.mode(), DisplayMode::Candlestick);
        assert_eq!(series.len(), 5);
        assert_eq!(coordinator.history().len(), 5);
    }

    #[test]
    fn test_live_amend_then_append() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());

        let last = T0 + 240;
        let delta = coordinator.apply_live_observation(&raw_bar(last, 110.0)).unwrap();
        assert!(matches!(delta, DisplayDelta::Upsert(bar) if bar.time == last && bar.close == 110.0));
        assert_eq!(coordinator.history().len(), 5);

        let delta = coordinator.apply_live_observation(&raw_bar(last + 60, 111.0)).unwrap();
        assert!(matches!(delta, DisplayDelta::Upsert(bar) if bar.time == last + 60));
        assert_eq!(coordinator.history().len(), 5);
        assert_eq!(coordinator.bars().len(), 6);

        let closed = raw_bar(last + 60, 112.0).with_closed(true);
        coordinator.apply_live_observation(&closed).unwrap();
        assert_eq!(coordinator.history().len(), 6);
        assert_eq!(coordinator.live_bar(), None);
    }

    #[test]
    fn test_unflagged_bar_is_superseded_not_committed() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());

        coordinator.apply_live_observation(&raw_bar(T0 + 300, 110.0)).unwrap();
        coordinator.apply_live_observation(&raw_bar(T0 + 360, 111.0)).unwrap();

        assert_eq!(coordinator.history().len(), 5);
        assert_eq!(coordinator.history().last().map(|bar| bar.time), Some(T0 + 240));
        assert_eq!(coordinator.live_bar().map(|bar| bar.time), Some(T0 + 360));
        assert_eq!(coordinator.bars().len(), 6);

        let stale = coordinator.apply_live_observation(&raw_bar(T0 + 300, 112.0).with_closed(true));
        assert!(matches!(stale, Err(BarstreamError::StaleObservation { .. })));
    }

    #[test]
    fn test_heikin_ashi_builds_on_last_closed_candle() {
        let config = SeriesConfig::default().with_display_mode(DisplayMode::HeikinAshi);
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), config);
        coordinator.apply_historical_batch(&minute_history());
        let committed = coordinator.history().to_vec();

        coordinator.apply_live_observation(&raw_bar(T0 + 300, 130.0)).unwrap();
        let later = raw_bar(T0 + 360, 111.0);
        let DisplayDelta::Upsert(candle) = coordinator.apply_live_observation(&later).unwrap() else {
            panic!("expected an upsert");
        };

        let later_bar = later.to_observation().unwrap().bar;
        let expected: Vec<Bar> = barstream_transform::heikin_ashi(
            committed.iter().chain(std::iter::once(&later_bar)),
        )
        .collect();
        assert_eq!(Some(&candle), expected.last());
    }

    #[test]
    fn test_stale_and_invalid_leave_state() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());
        let before = coordinator.history().to_vec();

        let stale = coordinator.apply_live_observation(&raw_bar(T0, 1.0));
        assert!(matches!(stale, Err(BarstreamError::StaleObservation { .. })));

        let invalid = RawObservation::ohlc(T0 + 600, 10.0, 9.0, 11.0, 10.0);
        let err = coordinator.apply_live_observation(&invalid).unwrap_err();
        assert!(err.is_recoverable());

        assert_eq!(coordinator.history(), before.as_slice());
    }

    #[test]
    fn test_heikin_ashi_live_matches_rederive() {
        let config = SeriesConfig::default().with_display_mode(DisplayMode::HeikinAshi);
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), config);
        coordinator.apply_historical_batch(&minute_history());

        let DisplayDelta::Upsert(live) = coordinator
            .apply_live_observation(&raw_bar(T0 + 300, 120.0))
            .unwrap()
        else {
            panic!("expected an upsert");
        };

        let DisplaySeries::HeikinAshi(candles) = coordinator.derive() else {
            panic!("expected heikin-ashi");
        };
        assert_eq!(candles.last(), Some(&live));
    }

    #[test]
    fn test_renko_live_bricks() {
        let config = SeriesConfig::default().with_display_mode(DisplayMode::Renko);
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), config);
        let series = coordinator.apply_historical_batch(&[raw_bar(T0, 100.0), raw_bar(T0 + 60, 105.0)]);
        assert!(series.is_empty());

        let delta = coordinator.apply_live_observation(&raw_bar(T0 + 120, 125.0)).unwrap();
        let DisplayDelta::Bricks(bricks) = delta else {
            panic!("expected bricks");
        };
        assert_eq!(bricks.len(), 2);
        assert_relative_eq!(bricks[1].close, 120.0);

        let delta = coordinator.apply_live_observation(&raw_bar(T0 + 120, 126.0)).unwrap();
        assert_eq!(delta, DisplayDelta::Unchanged);
    }

    #[test]
    fn test_display_mode_switch_rederives() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());
        let series = coordinator.set_display_mode(DisplayMode::HeikinAshi);
        assert_eq!(series.mode(), DisplayMode::HeikinAshi);
        assert_eq!(series.len(), 5);
        assert_eq!(coordinator.history().len(), 5);
    }

    #[test]
    fn test_brick_size_bounds() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());
        for bad in [0.0, -5.0, 1_000.5, f64::NAN] {
            assert!(matches!(
                coordinator.set_brick_sizing(BrickSizing::Fixed(bad)),
                Err(BarstreamError::InvalidBrickSize(_))
            ));
        }
        assert_relative_eq!(coordinator.brick_size(), DEFAULT_BRICK_SIZE);

        assert_eq!(coordinator.set_brick_sizing(BrickSizing::Fixed(1_000.0)).unwrap(), None);
        coordinator.set_display_mode(DisplayMode::Renko);
        let series = coordinator.set_brick_sizing(BrickSizing::Fixed(1.0)).unwrap().unwrap();
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn test_tick_resolution_routes_to_aggregator() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Ticks(100), SeriesConfig::default());
        coordinator.apply_historical_batch(&[raw_bar(T0, 100.0)]);

        let mut times = Vec::new();
        for (i, price) in [101.0, 102.0, 103.0, 104.0, 105.0, 106.0].into_iter().enumerate() {
            let delta = coordinator
                .apply_live_observation(&RawObservation::tick(T0 + i as i64, price))
                .unwrap();
            if let DisplayDelta::Upsert(bar) = delta {
                times.push(bar.time);
            }
        }
        assert_eq!(times, vec![T0 + 1, T0 + 1, T0 + 1, T0 + 1, T0 + 1, T0 + 5]);
        assert_eq!(coordinator.history().len(), 2);
        assert_eq!(coordinator.live_bar().map(|bar| bar.time), Some(T0 + 5));
    }

    #[test]
    fn test_display_mode_switch_clears_tick_accumulator() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Ticks(500), SeriesConfig::default());
        coordinator.apply_historical_batch(&[raw_bar(T0 - 10, 99.0)]);

        for price in [100.0, 102.0] {
            coordinator
                .apply_live_observation(&RawObservation::tick(T0, price))
                .unwrap();
        }
        assert_eq!(coordinator.live_bar().map(|bar| bar.volume), Some(2));

        coordinator.set_display_mode(DisplayMode::HeikinAshi);
        let series = coordinator.set_display_mode(DisplayMode::Candlestick);
        assert_eq!(series.len(), 1);
        assert_eq!(coordinator.live_bar(), None);

        let delta = coordinator
            .apply_live_observation(&RawObservation::tick(T0, 101.0))
            .unwrap();
        let DisplayDelta::Upsert(bar) = delta else {
            panic!("expected an upsert");
        };
        assert_eq!(bar.volume, 1);
        assert_relative_eq!(bar.open, 101.0);
        assert_relative_eq!(bar.high, 101.0);
        assert!(bar.time > T0 - 10);
        assert_eq!(coordinator.history().len(), 1);
    }

    #[test]
    fn test_change_resolution_discards_state() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        coordinator.apply_historical_batch(&minute_history());
        coordinator.change_resolution(Resolution::Ticks(500));
        assert!(coordinator.history().is_empty());
        assert_eq!(coordinator.resolution(), Resolution::Ticks(500));
        assert!(coordinator.renko_ladder().is_none());

        let delta = coordinator
            .apply_live_observation(&RawObservation::tick(T0, 1.0))
            .unwrap();
        assert!(matches!(delta, DisplayDelta::Upsert(bar) if bar.time == T0));
    }

    #[test]
    fn test_close_line() {
        let mut coordinator = SeriesCoordinator::new(Resolution::Minutes(1), SeriesConfig::default());
        let series = coordinator.apply_historical_batch(&minute_history());
        let line = series.close_line();
        assert_eq!(line.len(), 5);
        assert_relative_eq!(line[4].value, 104.0);
    }
}
