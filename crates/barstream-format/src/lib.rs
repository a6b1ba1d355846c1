//! Output formatters for barstream display series.
//!
//! - [`CsvFormatter`] - CSV or TSV with an optional header row
//! - [`JsonFormatter`] - JSON array (optionally pretty) or NDJSON

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(feature = "csv")]
mod csv;
mod formatter;
#[cfg(feature = "json")]
mod json;

#[cfg(feature = "csv")]
pub use crate::csv::CsvFormatter;
pub use formatter::{FormatError, Formatter, OutputFormat};
#[cfg(feature = "json")]
pub use json::{JsonFormatter, JsonStyle};
