//! Observation ingestion for the barstream series engine.
//!
//! Every bar or tick passes through this crate before touching series state:
//!
//! - [`normalize_timestamp`] - Infers the unit of a raw timestamp and yields epoch seconds
//! - [`RawObservation`] - Loosely-typed feed payload with field aliases
//! - [`validate_bar`] - Structural OHLC checks
//! - [`prepare_history`] - Sort and repair pass for historical batches
//!
//! # Example
//!
//! ```
//! use barstream_ingest::RawObservation;
//!
//! let raw: RawObservation =
//!     serde_json::from_str(r#"{"t": 1700000000000, "o": 1, "h": 2, "l": 1, "c": 2, "v": 5}"#)?;
//! let observation = raw.to_observation()?;
//! assert_eq!(observation.bar.time, 1_700_000_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod history;
mod observation;
mod timestamp;
mod validate;

pub use history::{HistoricalBatch, collapse_duplicate_times, prepare_history, repair_tick_times};
pub use observation::{HistoryResponse, RawNumber, RawObservation};
pub use timestamp::{
    RawTimestamp, YEAR_2000_SECS, YEAR_2033_MILLIS, YEAR_2100_SECS, normalize_timestamp,
};
pub use validate::{check_bar, validate_bar};
