//! Heikin-Ashi candles.

use barstream_types::Bar;

/// Recursive state carried from one Heikin-Ashi candle to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaState {
    /// Open of the previous HA candle.
    pub prev_open: f64,
    /// Close of the previous HA candle.
    pub prev_close: f64,
}

impl From<&Bar> for HaState {
    fn from(candle: &Bar) -> Self {
        Self {
            prev_open: candle.open,
            prev_close: candle.close,
        }
    }
}

/// Computes one HA candle from a raw bar and the previous candle's state.
///
/// `close = (o + h + l + c) / 4`, `open = (prev_open + prev_close) / 2`
/// (or `(o + c) / 2` without state), and the wicks extend to cover both
/// the raw extremes and the new body.
#[must_use]
pub fn heikin_ashi_candle(bar: &Bar, prev: Option<HaState>) -> Bar {
    let close = (bar.open + bar.high + bar.low + bar.close) / 4.0;
    let open = prev.map_or((bar.open + bar.close) / 2.0, |state| {
        (state.prev_open + state.prev_close) / 2.0
    });
    let high = bar.high.max(open).max(close);
    let low = bar.low.min(open).min(close);
    Bar::new(bar.time, open, high, low, close, bar.volume)
}

/// Lazily converts an ordered bar sequence to HA candles.
///
/// State threads from the first bar, so the sequence restarts cleanly each
/// time it is called.
pub fn heikin_ashi<'a, I>(bars: I) -> impl Iterator<Item = Bar> + 'a
where
    I: IntoIterator<Item = &'a Bar>,
    I::IntoIter: 'a,
{
    bars.into_iter().scan(None, |state: &mut Option<HaState>, bar| {
        let candle = heikin_ashi_candle(bar, *state);
        *state = Some(HaState::from(&candle));
        Some(candle)
    })
}

/// Incremental Heikin-Ashi transformer.
///
/// Recursion state advances only on committed bars. An open bar, amended or
/// superseded, always recomputes from the last committed candle.
#[derive(Debug, Default)]
pub struct HeikinAshi {
    /// State before the last committed candle, for amending it.
    before_committed: Option<HaState>,
    committed: Option<Bar>,
    open: Option<Bar>,
}

impl HeikinAshi {
    /// Creates an empty transformer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            before_committed: None,
            committed: None,
            open: None,
        }
    }

    /// Returns the latest candle, open or committed.
    #[must_use]
    pub fn last(&self) -> Option<Bar> {
        self.open.or(self.committed)
    }

    /// Returns the last committed candle.
    #[must_use]
    pub const fn committed(&self) -> Option<Bar> {
        self.committed
    }

    /// Clears all recursive state.
    pub const fn reset(&mut self) {
        self.before_committed = None;
        self.committed = None;
        self.open = None;
    }

    /// Converts a committed history, replacing any previous state.
    pub fn convert(&mut self, bars: &[Bar]) -> Vec<Bar> {
        self.reset();
        let candles: Vec<Bar> = heikin_ashi(bars).collect();
        if let [.., previous, _] = candles.as_slice() {
            self.before_committed = Some(HaState::from(previous));
        }
        self.committed = candles.last().copied();
        candles
    }

    /// Applies one live bar.
    ///
    /// A bar at the committed candle's time amends it. Otherwise the candle
    /// builds on the committed one and, when `closed`, becomes the new
    /// committed candle; an unclosed candle stays open.
    pub fn update(&mut self, bar: &Bar, closed: bool) -> Bar {
        if let Some(committed) = self.committed
            && bar.time == committed.time
        {
            let candle = heikin_ashi_candle(bar, self.before_committed);
            self.committed = Some(candle);
            self.open = None;
            return candle;
        }

        let candle = heikin_ashi_candle(bar, self.committed.as_ref().map(HaState::from));
        if closed {
            self.before_committed = self.committed.as_ref().map(HaState::from);
            self.committed = Some(candle);
            self.open = None;
        } else {
            self.open = Some(candle);
        }
        candle
    }
}
