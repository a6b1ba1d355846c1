//! Live bar formation for the barstream series engine.
//!
//! - [`TickAggregator`] - Folds ticks into synthetic bars of a fixed tick count
//! - [`BarMerger`] - Decides whether a live bar opens, amends, commits or is stale

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod merge;
mod tick;

pub use merge::{BarMerger, MergeOutcome, MergeState};
pub use tick::{
    DEFAULT_IDLE_FLUSH_SECS, TickAggregator, TickAggregatorConfig, TickStep, ticks_per_bar,
};
