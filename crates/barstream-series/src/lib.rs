//! Series coordination for the barstream engine.
//!
//! - [`SeriesCoordinator`] - Raw bars plus the active display transform
//! - [`SeriesSession`] - Applies [`SeriesCommand`]s in order and emits [`SeriesEvent`]s
//! - [`HistorySource`] / [`LiveFeed`] - Data-source collaborators

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coordinator;
mod session;
mod source;

pub use coordinator::{
    DisplayDelta, DisplaySeries, MAX_BRICK_SIZE, SeriesConfig, SeriesCoordinator,
    validate_brick_sizing,
};
pub use session::{
    DEFAULT_FETCH_TIMEOUT, FeedStatus, SeriesCommand, SeriesEvent, SeriesSession, SessionConfig,
};
pub use source::{FeedCall, HistorySource, LiveFeed, RecordingFeed, StaticHistory};
