//! Core types for the barstream series engine.
//!
//! This crate provides the fundamental data structures used throughout barstream:
//!
//! - [`Bar`] - An OHLCV bar with an epoch-second timestamp
//! - [`Observation`] - A validated live bar plus its closed flag
//! - [`Tick`] - A single price/volume observation
//! - [`LinePoint`] - A `{time, value}` overlay point
//! - [`Resolution`] - Bar resolution identifier (tick, second, minute, ...)
//! - [`DisplayMode`] - Candlestick, Heikin-Ashi or Renko presentation
//! - [`HistoryRequest`] - Window for historical data retrieval

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod display;
mod error;
mod history;
mod resolution;

pub use bar::{Bar, LinePoint, Observation, Tick};
pub use display::{DisplayMode, DisplayModeParseError};
pub use error::{BarDefect, BarstreamError, HistoryWindowError, Result};
pub use history::{DEFAULT_LOOKBACK, HistoryRequest};
pub use resolution::{Resolution, ResolutionParseError};
