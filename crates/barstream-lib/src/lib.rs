//! Streaming OHLCV series engine.
//!
//! This is a facade crate that re-exports the barstream workspace crates.
//!
//! # Quick Start
//!
//! ```
//! use barstream_lib::prelude::*;
//!
//! let raw = vec![
//!     RawObservation::ohlc(1_700_000_000, 100.0, 104.0, 99.0, 103.0),
//!     RawObservation::ohlc(1_700_000_060, 103.0, 125.0, 102.0, 124.0),
//! ];
//! let bars = prepare_history(&raw, Resolution::Minutes(1)).bars;
//!
//! let mut renko = RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(10.0)));
//! let bricks = renko.convert(&bars);
//! assert_eq!(bricks.len(), 2);
//! assert!(bricks.iter().all(|brick| brick.direction == BrickDirection::Up));
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use barstream_types::*;

// Re-export resolution table
pub use barstream_resolutions::{ResolutionRegistry, ResolutionSpec};

// Re-export ingestion
pub use barstream_ingest::{
    HistoricalBatch, HistoryResponse, RawObservation, RawTimestamp, check_bar,
    normalize_timestamp, prepare_history, validate_bar,
};

// Re-export bar formation
pub use barstream_aggregate::{
    BarMerger, MergeOutcome, TickAggregator, TickAggregatorConfig, ticks_per_bar,
};

// Re-export display transforms
pub use barstream_transform::{
    BrickDirection, BrickSizing, HeikinAshi, RenkoBrick, RenkoConfig, RenkoEngine,
    atr_brick_size, heikin_ashi,
};

// Re-export series coordination
#[cfg(feature = "series")]
pub use barstream_series::{
    DisplayDelta, DisplaySeries, FeedStatus, HistorySource, LiveFeed, MAX_BRICK_SIZE,
    SeriesCommand, SeriesConfig, SeriesCoordinator, SeriesEvent, SeriesSession, SessionConfig,
    validate_brick_sizing,
};

// Re-export formatters
#[cfg(feature = "format")]
pub use barstream_format::{CsvFormatter, FormatError, Formatter, JsonFormatter, OutputFormat};

/// Prelude module for convenient imports.
///
/// ```
/// use barstream_lib::prelude::*;
/// ```
pub mod prelude {
    pub use barstream_types::{
        Bar, BarstreamError, DisplayMode, HistoryRequest, LinePoint, Resolution, Result, Tick,
    };

    pub use barstream_resolutions::ResolutionRegistry;

    pub use barstream_ingest::{RawObservation, prepare_history};

    pub use barstream_aggregate::{BarMerger, TickAggregator};

    pub use barstream_transform::{
        BrickDirection, BrickSizing, HeikinAshi, RenkoBrick, RenkoConfig, RenkoEngine,
    };

    #[cfg(feature = "series")]
    pub use barstream_series::{
        DisplayDelta, DisplaySeries, HistorySource, LiveFeed, SeriesCommand, SeriesCoordinator,
        SeriesEvent, SeriesSession,
    };

    #[cfg(feature = "format")]
    pub use barstream_format::{CsvFormatter, Formatter, JsonFormatter, OutputFormat};
}
