//! Renko brick ladder.
//!
//! A brick is emitted each time the close moves a full brick size beyond
//! the current ladder boundaries. The engine keeps the ladder between calls
//! so live bars continue exactly where a historical conversion stopped.

use barstream_types::Bar;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atr::atr_brick_size;

/// Brick size used when none is configured.
pub const DEFAULT_BRICK_SIZE: f64 = 10.0;

/// Direction of a brick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrickDirection {
    /// Price rose by one brick.
    #[default]
    Up,
    /// Price fell by one brick.
    Down,
}

impl BrickDirection {
    /// Returns the direction as a lowercase identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for BrickDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the brick size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrickSizing {
    /// A fixed price move.
    Fixed(f64),
    /// Half the 14-bar ATR of the converted history.
    Atr,
}

impl Default for BrickSizing {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BRICK_SIZE)
    }
}

impl std::fmt::Display for BrickSizing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(size) => write!(f, "{size}"),
            Self::Atr => f.write_str("atr"),
        }
    }
}

/// Configuration for [`RenkoEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenkoConfig {
    /// Brick sizing policy.
    pub sizing: BrickSizing,
    /// Decimal places brick prices are rounded to for display.
    pub price_decimals: Option<u32>,
}

impl Default for RenkoConfig {
    fn default() -> Self {
        Self {
            sizing: BrickSizing::Fixed(DEFAULT_BRICK_SIZE),
            price_decimals: Some(2),
        }
    }
}

impl RenkoConfig {
    /// Creates a config with the given sizing and two-decimal rounding.
    #[must_use]
    pub const fn new(sizing: BrickSizing) -> Self {
        Self {
            sizing,
            price_decimals: Some(2),
        }
    }

    /// Sets display rounding; `None` keeps full precision.
    #[must_use]
    pub const fn with_price_decimals(mut self, decimals: Option<u32>) -> Self {
        self.price_decimals = decimals;
        self
    }
}

/// A Renko brick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenkoBrick {
    /// Synthetic, strictly increasing sequence time.
    pub time: i64,
    /// Time of the bar that produced the brick.
    pub source_time: i64,
    /// Opening boundary.
    pub open: f64,
    /// Upper boundary.
    pub high: f64,
    /// Lower boundary.
    pub low: f64,
    /// Closing boundary.
    pub close: f64,
    /// Volume of the producing bar.
    pub volume: u64,
    /// Brick direction.
    pub direction: BrickDirection,
}

impl RenkoBrick {
    /// Returns the brick as a plain bar at its sequence time.
    #[must_use]
    pub const fn as_bar(&self) -> Bar {
        Bar::new(
            self.time,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }

    /// Returns true if prices are finite and consistent with the direction.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite());
        let directional = match self.direction {
            BrickDirection::Up => self.high == self.close && self.low == self.open,
            BrickDirection::Down => self.low == self.close && self.high == self.open,
        };
        finite && self.time > 0 && self.high >= self.low && directional
    }
}

/// Running ladder boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenkoLadderState {
    /// Upper boundary of the last brick.
    pub last_brick_high: f64,
    /// Lower boundary of the last brick.
    pub last_brick_low: f64,
    /// Direction of the last brick.
    pub direction: BrickDirection,
    /// Sequence time of the last brick.
    pub last_brick_time: Option<i64>,
}

impl RenkoLadderState {
    /// Creates a ladder collapsed onto a single price.
    #[must_use]
    pub const fn at_price(price: f64) -> Self {
        Self {
            last_brick_high: price,
            last_brick_low: price,
            direction: BrickDirection::Up,
            last_brick_time: None,
        }
    }

    /// Returns the sequence time for the first brick produced at `bar_time`.
    #[must_use]
    pub fn next_time(&self, bar_time: i64) -> i64 {
        self.last_brick_time
            .map_or(bar_time, |last| bar_time.max(last + 1))
    }

    /// Moves the ladder toward `price`, returning the unrounded bricks.
    ///
    /// Bricks are numbered `first_time, first_time + 1, ...`.
    fn climb(&mut self, price: f64, size: f64, bar: &Bar, first_time: i64) -> Vec<RenkoBrick> {
        let mut bricks = Vec::new();
        let mut time = first_time;

        while price >= self.last_brick_high + size {
            let open = self.last_brick_high;
            let close = open + size;
            bricks.push(RenkoBrick {
                time,
                source_time: bar.time,
                open,
                high: close,
                low: open,
                close,
                volume: bar.volume,
                direction: BrickDirection::Up,
            });
            self.last_brick_high = close;
            self.last_brick_low = open;
            self.direction = BrickDirection::Up;
            time += 1;
        }

        while price <= self.last_brick_low - size {
            let open = self.last_brick_low;
            let close = open - size;
            bricks.push(RenkoBrick {
                time,
                source_time: bar.time,
                open,
                high: open,
                low: close,
                close,
                volume: bar.volume,
                direction: BrickDirection::Down,
            });
            self.last_brick_low = close;
            self.last_brick_high = open;
            self.direction = BrickDirection::Down;
            time += 1;
        }

        bricks
    }
}

/// Forces each brick's time past its predecessor's.
///
/// Returns how many bricks were moved.
pub fn repair_brick_times(bricks: &mut [RenkoBrick]) -> usize {
    let mut repaired = 0;
    for i in 1..bricks.len() {
        let floor = bricks[i - 1].time + 1;
        if bricks[i].time < floor {
            bricks[i].time = floor;
            repaired += 1;
        }
    }
    repaired
}

fn round_to(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(d) => {
            let scale = 10f64.powi(d.min(15) as i32);
            (value * scale).round() / scale
        }
        None => value,
    }
}

/// Stateful Renko converter.
#[derive(Debug)]
pub struct RenkoEngine {
    config: RenkoConfig,
    brick_size: f64,
    ladder: Option<RenkoLadderState>,
}

impl Default for RenkoEngine {
    fn default() -> Self {
        Self::new(RenkoConfig::default())
    }
}

impl RenkoEngine {
    /// Creates an engine with an empty ladder.
    ///
    /// ATR sizing starts from the default ATR until a history is converted.
    #[must_use]
    pub fn new(config: RenkoConfig) -> Self {
        Self {
            config,
            brick_size: Self::resolve_size(config.sizing, &[]),
            ladder: None,
        }
    }

    fn resolve_size(sizing: BrickSizing, bars: &[Bar]) -> f64 {
        match sizing {
            BrickSizing::Fixed(size) => size,
            BrickSizing::Atr => atr_brick_size(bars),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> RenkoConfig {
        self.config
    }

    /// Returns the brick size in effect.
    #[must_use]
    pub const fn brick_size(&self) -> f64 {
        self.brick_size
    }

    /// Returns the ladder state, if seeded.
    #[must_use]
    pub const fn ladder(&self) -> Option<RenkoLadderState> {
        self.ladder
    }

    /// Replaces the ladder state.
    pub const fn set_ladder(&mut self, ladder: Option<RenkoLadderState>) {
        self.ladder = ladder;
    }

    /// Changes sizing and clears the ladder.
    pub fn set_sizing(&mut self, sizing: BrickSizing) {
        self.config.sizing = sizing;
        self.brick_size = Self::resolve_size(sizing, &[]);
        self.ladder = None;
    }

    /// Clears the ladder.
    pub const fn reset(&mut self) {
        self.ladder = None;
    }

    fn size_is_usable(&self) -> bool {
        self.brick_size.is_finite() && self.brick_size > 0.0
    }

    fn finish(&self, bricks: Vec<RenkoBrick>) -> Vec<RenkoBrick> {
        bricks
            .into_iter()
            .map(|brick| RenkoBrick {
                open: round_to(brick.open, self.config.price_decimals),
                high: round_to(brick.high, self.config.price_decimals),
                low: round_to(brick.low, self.config.price_decimals),
                close: round_to(brick.close, self.config.price_decimals),
                ..brick
            })
            .filter(RenkoBrick::is_well_formed)
            .collect()
    }

    /// Converts a full history, replacing the ladder.
    ///
    /// The ladder is seeded at the first bar's close; every later close
    /// climbs it. Bricks from one bar are numbered from the bar's time and
    /// then repaired to be strictly increasing across bars.
    pub fn convert(&mut self, bars: &[Bar]) -> Vec<RenkoBrick> {
        self.brick_size = Self::resolve_size(self.config.sizing, bars);
        self.ladder = None;

        let Some((first, rest)) = bars.split_first() else {
            return Vec::new();
        };
        let mut ladder = RenkoLadderState::at_price(first.close);
        if !self.size_is_usable() {
            self.ladder = Some(ladder);
            return Vec::new();
        }

        let mut raw = Vec::new();
        for bar in rest.iter().filter(|bar| bar.close.is_finite()) {
            raw.extend(ladder.climb(bar.close, self.brick_size, bar, bar.time));
        }

        let mut bricks = self.finish(raw);
        repair_brick_times(&mut bricks);
        ladder.last_brick_time = bricks.last().map(|brick| brick.time);
        self.ladder = Some(ladder);

        debug!(bars = bars.len(), bricks = bricks.len(), brick_size = self.brick_size, "renko conversion");
        bricks
    }

    /// Applies one live bar, returning only the new bricks.
    ///
    /// Without a seeded ladder or with a non-positive brick size this is a
    /// no-op.
    pub fn update(&mut self, bar: &Bar) -> Vec<RenkoBrick> {
        if !self.size_is_usable() || !bar.close.is_finite() {
            return Vec::new();
        }
        let Some(ladder) = self.ladder.as_mut() else {
            return Vec::new();
        };

        let first_time = ladder.next_time(bar.time);
        let raw = ladder.climb(bar.close, self.brick_size, bar, first_time);
        let last_raw_time = raw.last().map(|brick| brick.time);
        if let Some(time) = last_raw_time {
            ladder.last_brick_time = Some(time);
        }

        let bricks = self.finish(raw);
        if !bricks.is_empty() {
            debug!(time = bar.time, bricks = bricks.len(), "renko bricks appended");
        }
        bricks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn close_bar(time: i64, close: f64) -> Bar {
        Bar::new(time, close, close, close, close, 7)
    }

    #[test]
    fn test_ladder_with_partial_move() {
        let mut engine = RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(10.0)));
        engine.set_ladder(Some(RenkoLadderState {
            last_brick_high: 100.0,
            last_brick_low: 90.0,
            direction: BrickDirection::Up,
            last_brick_time: Some(1_000),
        }));

        let bricks = engine.update(&close_bar(2_000, 125.0));
        assert_eq!(bricks.len(), 2);
        assert_relative_eq!(bricks[0].open, 100.0);
        assert_relative_eq!(bricks[0].close, 110.0);
        assert_relative_eq!(bricks[1].open, 110.0);
        assert_relative_eq!(bricks[1].close, 120.0);
        assert_eq!(bricks[0].time, 2_000);
        assert_eq!(bricks[1].time, 2_001);
        assert!(bricks.iter().all(|b| b.direction == BrickDirection::Up));

        let ladder = engine.ladder().unwrap();
        assert_relative_eq!(ladder.last_brick_high, 120.0);
        assert_relative_eq!(ladder.last_brick_low, 110.0);
        assert_eq!(ladder.last_brick_time, Some(2_001));
    }

    #[test]
    fn test_down_bricks() {
        let mut engine = RenkoEngine::default();
        let bricks = engine.convert(&[close_bar(60, 100.0), close_bar(120, 75.0)]);
        assert_eq!(bricks.len(), 2);
        assert_eq!(bricks[0].direction, BrickDirection::Down);
        assert_relative_eq!(bricks[0].high, 100.0);
        assert_relative_eq!(bricks[0].low, 90.0);
        assert_relative_eq!(bricks[1].close, 80.0);
        assert_eq!(bricks[0].time, 120);
        assert_eq!(bricks[1].time, 121);
        assert_eq!(bricks[1].source_time, 120);
        assert_eq!(bricks[1].volume, 7);
    }

    #[test]
    fn test_reversal_needs_full_brick_below_low() {
        let mut engine = RenkoEngine::default();
        let bricks = engine.convert(&[
            close_bar(60, 100.0),
            close_bar(120, 120.0),
            close_bar(180, 101.0),
            close_bar(240, 100.0),
        ]);
        // Up 100→110→120, then the low boundary is 110; 100 is a full brick below.
        let directions: Vec<_> = bricks.iter().map(|b| b.direction).collect();
        assert_eq!(
            directions,
            vec![BrickDirection::Up, BrickDirection::Up, BrickDirection::Down]
        );
        assert_relative_eq!(bricks[2].open, 110.0);
        assert_relative_eq!(bricks[2].close, 100.0);
    }

    #[test]
    fn test_colliding_times_repaired() {
        let mut engine = RenkoEngine::default();
        let bricks = engine.convert(&[
            close_bar(100, 0.0),
            close_bar(101, 30.0),
            close_bar(102, 60.0),
        ]);
        let times: Vec<i64> = bricks.iter().map(|b| b.time).collect();
        assert_eq!(times, vec![101, 102, 103, 104, 105, 106]);
    }

    #[test]
    fn test_update_without_ladder_is_noop() {
        let mut engine = RenkoEngine::default();
        assert!(engine.update(&close_bar(60, 1_000.0)).is_empty());
        assert!(engine.ladder().is_none());
    }

    #[test]
    fn test_non_positive_size_is_noop() {
        let mut engine = RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(0.0)));
        engine.set_ladder(Some(RenkoLadderState::at_price(100.0)));
        assert!(engine.update(&close_bar(60, 1_000.0)).is_empty());
    }

    #[test]
    fn test_convert_seeds_ladder_without_bricks() {
        let mut engine = RenkoEngine::default();
        assert!(engine.convert(&[close_bar(60, 100.0), close_bar(120, 105.0)]).is_empty());
        let ladder = engine.ladder().unwrap();
        assert_relative_eq!(ladder.last_brick_high, 100.0);
        assert_eq!(ladder.last_brick_time, None);
        assert_eq!(engine.update(&close_bar(180, 110.0)).len(), 1);
    }

    #[test]
    fn test_display_rounding() {
        let mut engine = RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(0.333)));
        let bricks = engine.convert(&[close_bar(60, 1.0), close_bar(120, 1.7)]);
        assert_eq!(bricks.len(), 2);
        assert_relative_eq!(bricks[1].close, 1.67);
        let ladder = engine.ladder().unwrap();
        assert_relative_eq!(ladder.last_brick_high, 1.666, epsilon = 1e-9);
    }

    #[test]
    fn test_atr_sizing() {
        let mut engine = RenkoEngine::new(RenkoConfig::new(BrickSizing::Atr));
        assert_relative_eq!(engine.brick_size(), 25.0);
        engine.convert(&[close_bar(60, 100.0)]);
        assert_relative_eq!(engine.brick_size(), 25.0);
    }

    #[test]
    fn test_set_sizing_clears_ladder() {
        let mut engine = RenkoEngine::default();
        engine.convert(&[close_bar(60, 100.0)]);
        assert!(engine.ladder().is_some());
        engine.set_sizing(BrickSizing::Fixed(5.0));
        assert!(engine.ladder().is_none());
        assert_relative_eq!(engine.brick_size(), 5.0);
    }

    #[test]
    fn test_as_bar() {
        let brick = RenkoBrick {
            time: 5,
            source_time: 4,
            open: 1.0,
            high: 2.0,
            low: 1.0,
            close: 2.0,
            volume: 3,
            direction: BrickDirection::Up,
        };
        assert!(brick.is_well_formed());
        assert_eq!(brick.as_bar(), Bar::new(5, 1.0, 2.0, 1.0, 2.0, 3));
    }
}
