//! Display transforms for the barstream series engine.
//!
//! - [`heikin_ashi`] / [`HeikinAshi`] - Smoothed candles, batch and incremental
//! - [`average_true_range`] / [`atr_brick_size`] - Volatility-derived brick sizing
//! - [`RenkoEngine`] - Fixed-move brick ladder, batch and incremental

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/barstream/barstream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod atr;
mod heikin_ashi;
mod renko;

pub use atr::{ATR_PERIOD, DEFAULT_ATR, atr_brick_size, average_true_range, true_range};
pub use heikin_ashi::{HaState, HeikinAshi, heikin_ashi, heikin_ashi_candle};
pub use renko::{
    BrickDirection, BrickSizing, DEFAULT_BRICK_SIZE, RenkoBrick, RenkoConfig, RenkoEngine,
    RenkoLadderState, repair_brick_times,
};
