//! Live bar merge state machine.

use barstream_types::{Bar, BarstreamError, Observation};
use tracing::debug;

/// State of the live bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MergeState {
    /// No bar has been seen.
    #[default]
    NoBar,
    /// The latest bar is committed; same-time observations still amend it.
    Committed(Bar),
    /// A bar past the committed time is open and not yet flagged closed.
    Open {
        /// Latest values of the open bar.
        bar: Bar,
        /// Time of the last committed bar.
        committed: Option<i64>,
    },
}

/// What applying an observation did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// A new bar opened without a closed flag.
    Opened {
        /// The newly opened bar.
        bar: Bar,
        /// An earlier open bar that was never flagged closed, now discarded.
        superseded: Option<Bar>,
    },
    /// The open bar was replaced in place and is still open.
    Amended(Bar),
    /// The bar is final: flagged closed, or an amendment of the committed bar.
    Committed(Bar),
}

impl MergeOutcome {
    /// Returns the bar downstream transforms must see.
    #[must_use]
    pub const fn bar(&self) -> Bar {
        match self {
            Self::Opened { bar, .. } | Self::Amended(bar) | Self::Committed(bar) => *bar,
        }
    }

    /// Returns true if the bar is now part of history.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Decides whether a live bar opens, amends, commits, or is rejected.
///
/// `L` is the time of the last committed bar. Only observations flagged
/// closed by the source commit and advance `L`; an unflagged bar stays open
/// and is replaced by later observations. Anything older than the newest
/// known bar (open or committed) is stale.
#[derive(Debug, Default)]
pub struct BarMerger {
    committed: Option<Bar>,
    open: Option<Bar>,
}

impl BarMerger {
    /// Creates a merger with no bar.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            committed: None,
            open: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> MergeState {
        match (self.open, self.committed) {
            (Some(bar), committed) => MergeState::Open {
                bar,
                committed: committed.map(|c| c.time),
            },
            (None, Some(bar)) => MergeState::Committed(bar),
            (None, None) => MergeState::NoBar,
        }
    }

    /// Returns `L`, the last committed bar time.
    #[must_use]
    pub fn committed_time(&self) -> Option<i64> {
        self.committed.map(|bar| bar.time)
    }

    /// Returns the open bar, if one is waiting for its closed flag.
    #[must_use]
    pub const fn open_bar(&self) -> Option<Bar> {
        self.open
    }

    /// Returns the time of the newest bar, open or committed.
    #[must_use]
    pub fn last_time(&self) -> Option<i64> {
        self.open.or(self.committed).map(|bar| bar.time)
    }

    /// Seeds `L` from the last historical bar.
    pub const fn seed(&mut self, bar: Bar) {
        self.committed = Some(bar);
        self.open = None;
    }

    /// Returns to [`MergeState::NoBar`].
    pub const fn reset(&mut self) {
        self.committed = None;
        self.open = None;
    }

    /// Applies a validated observation.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::StaleObservation`] if the observation is
    /// older than the newest known bar. State is unchanged.
    pub fn apply(&mut self, observation: Observation) -> Result<MergeOutcome, BarstreamError> {
        let Observation { bar, closed } = observation;

        if let Some(last) = self.last_time()
            && bar.time < last
        {
            debug!(time = bar.time, last, "stale observation");
            return Err(BarstreamError::StaleObservation {
                time: bar.time,
                last,
            });
        }

        let outcome = match (self.open, self.committed) {
            (None, Some(committed)) if bar.time == committed.time => {
                debug!(time = bar.time, close = bar.close, "committed bar amended");
                self.committed = Some(bar);
                MergeOutcome::Committed(bar)
            }
            (open, _) if closed => {
                if let Some(open) = open.filter(|open| open.time < bar.time) {
                    debug!(time = open.time, "unclosed bar superseded");
                }
                debug!(time = bar.time, close = bar.close, "bar committed");
                self.committed = Some(bar);
                self.open = None;
                MergeOutcome::Committed(bar)
            }
            (Some(open), _) if bar.time == open.time => {
                debug!(time = bar.time, close = bar.close, "bar amended");
                self.open = Some(bar);
                MergeOutcome::Amended(bar)
            }
            (open, _) => {
                if let Some(open) = open {
                    debug!(time = open.time, "unclosed bar superseded");
                }
                debug!(time = bar.time, "bar opened");
                self.open = Some(bar);
                MergeOutcome::Opened {
                    bar,
                    superseded: open,
                }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(time: i64, close: f64, closed: bool) -> Observation {
        Observation::new(Bar::new(time, close, close, close, close, 1), closed)
    }

    #[test]
    fn test_first_observation_opens() {
        let mut merger = BarMerger::new();
        assert_eq!(merger.last_time(), None);
        let outcome = merger.apply(obs(1000, 5.0, false)).unwrap();
        assert!(matches!(outcome, MergeOutcome::Opened { superseded: None, .. }));
        assert_eq!(merger.last_time(), Some(1000));
        assert_eq!(merger.committed_time(), None);
    }

    #[test]
    fn test_stale_amend_commit_sequence() {
        let mut merger = BarMerger::new();
        merger.seed(Bar::flat(1000, 10.0, 3));

        let before = merger.state();
        assert!(matches!(
            merger.apply(obs(999, 11.0, false)),
            Err(BarstreamError::StaleObservation {
                time: 999,
                last: 1000
            })
        ));
        assert_eq!(merger.state(), before);

        let amended = merger.apply(obs(1000, 12.0, false)).unwrap();
        assert!(matches!(amended, MergeOutcome::Committed(bar) if bar.close == 12.0));
        assert_eq!(merger.committed_time(), Some(1000));

        let outcome = merger.apply(obs(1001, 13.0, true)).unwrap();
        assert!(matches!(outcome, MergeOutcome::Committed(bar) if bar.time == 1001));
        assert_eq!(merger.committed_time(), Some(1001));
        assert_eq!(merger.open_bar(), None);
    }

    #[test]
    fn test_unflagged_bar_is_never_committed() {
        let mut merger = BarMerger::new();
        merger.seed(Bar::flat(1000, 10.0, 1));

        merger.apply(obs(1060, 11.0, false)).unwrap();
        let outcome = merger.apply(obs(1120, 12.0, false)).unwrap();

        let MergeOutcome::Opened { bar, superseded } = outcome else {
            panic!("expected a new open bar, got {outcome:?}");
        };
        assert_eq!(bar.time, 1120);
        assert_eq!(superseded.map(|b| b.time), Some(1060));
        assert_eq!(merger.committed_time(), Some(1000));
        assert!(matches!(
            merger.state(),
            MergeState::Open {
                committed: Some(1000),
                ..
            }
        ));
    }

    #[test]
    fn test_open_bar_amends_then_commits_on_flag() {
        let mut merger = BarMerger::new();
        merger.seed(Bar::flat(1000, 10.0, 1));

        merger.apply(obs(1060, 11.0, false)).unwrap();
        let amended = merger.apply(obs(1060, 11.5, false)).unwrap();
        assert!(matches!(amended, MergeOutcome::Amended(bar) if bar.close == 11.5));
        assert_eq!(merger.committed_time(), Some(1000));

        let outcome = merger.apply(obs(1060, 12.0, true)).unwrap();
        assert!(outcome.is_committed());
        assert_relative_eq!(outcome.bar().close, 12.0);
        assert_eq!(merger.committed_time(), Some(1060));
        assert_eq!(merger.state(), MergeState::Committed(outcome.bar()));
    }

    #[test]
    fn test_older_than_open_bar_is_stale() {
        let mut merger = BarMerger::new();
        merger.seed(Bar::flat(1000, 10.0, 1));
        merger.apply(obs(1120, 11.0, false)).unwrap();
        assert!(matches!(
            merger.apply(obs(1060, 12.0, true)),
            Err(BarstreamError::StaleObservation {
                time: 1060,
                last: 1120
            })
        ));
    }

    #[test]
    fn test_amend_is_last_write_wins() {
        let mut merger = BarMerger::new();
        merger.apply(obs(1000, 1.0, false)).unwrap();
        merger.apply(obs(1000, 2.0, false)).unwrap();
        let outcome = merger.apply(obs(1000, 3.0, true)).unwrap();
        assert_relative_eq!(outcome.bar().close, 3.0);
    }

    #[test]
    fn test_reset() {
        let mut merger = BarMerger::new();
        merger.apply(obs(1000, 1.0, true)).unwrap();
        merger.reset();
        assert_eq!(merger.state(), MergeState::NoBar);
    }
}
