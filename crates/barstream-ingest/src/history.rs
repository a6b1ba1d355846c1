//! Historical batch preparation.

use barstream_types::{Bar, Resolution};
use tracing::{debug, info, warn};

use crate::observation::RawObservation;

/// Prepared historical bars plus what the pipeline had to discard or fix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalBatch {
    /// Valid bars in strictly increasing time order.
    pub bars: Vec<Bar>,
    /// Observations dropped for a malformed timestamp or invalid shape.
    pub rejected: usize,
    /// Bars whose time was forced forward or collapsed as a duplicate.
    pub repaired: usize,
}

impl HistoricalBatch {
    /// Returns true if no bars survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Returns the last bar, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// Normalizes, validates, sorts and repairs a historical response.
///
/// Invalid observations are dropped and counted. Tick resolutions force
/// duplicate or regressing times forward by one second; time resolutions
/// collapse duplicate times keeping the later observation.
#[must_use]
pub fn prepare_history(raw: &[RawObservation], resolution: Resolution) -> HistoricalBatch {
    let mut rejected = 0;
    let mut bars: Vec<Bar> = raw
        .iter()
        .filter_map(|observation| match observation.to_observation() {
            Ok(observation) => Some(observation.bar),
            Err(err) => {
                debug!(error = %err, "dropping historical observation");
                rejected += 1;
                None
            }
        })
        .collect();

    if rejected > 0 {
        warn!(rejected, total = raw.len(), %resolution, "historical batch contained invalid bars");
    }

    bars.sort_by_key(|bar| bar.time);

    let (bars, repaired) = if resolution.is_tick() {
        let repaired = repair_tick_times(&mut bars);
        (bars, repaired)
    } else {
        collapse_duplicate_times(bars)
    };

    info!(bars = bars.len(), rejected, repaired, %resolution, "prepared historical batch");

    HistoricalBatch {
        bars,
        rejected,
        repaired,
    }
}

/// Forces strictly increasing times on sorted tick bars.
///
/// Any bar whose time is not past its predecessor becomes predecessor + 1.
/// Returns how many bars were moved.
pub fn repair_tick_times(bars: &mut [Bar]) -> usize {
    let mut repaired = 0;
    let mut previous: Option<i64> = None;
    for bar in bars.iter_mut() {
        if let Some(prev) = previous
            && bar.time <= prev
        {
            bar.time = prev + 1;
            repaired += 1;
        }
        previous = Some(bar.time);
    }
    repaired
}

/// Collapses equal times in sorted bars, keeping the last of each run.
///
/// Returns the collapsed bars and how many were discarded.
#[must_use]
pub fn collapse_duplicate_times(bars: Vec<Bar>) -> (Vec<Bar>, usize) {
    let total = bars.len();
    let mut collapsed: Vec<Bar> = Vec::with_capacity(total);
    for bar in bars {
        match collapsed.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => collapsed.push(bar),
        }
    }
    let discarded = total - collapsed.len();
    (collapsed, discarded)
}
