//! Collaborator interfaces for historical data and live subscriptions.

use std::sync::Mutex;

use async_trait::async_trait;
use barstream_ingest::RawObservation;
use barstream_types::{BarstreamError, HistoryRequest, Resolution};

/// Request/response source of historical bars.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetches raw bars for the request window.
    async fn fetch(&self, request: &HistoryRequest) -> Result<Vec<RawObservation>, BarstreamError>;
}

/// Push-based live update feed.
///
/// Pushes themselves arrive as [`SeriesCommand::Live`](crate::SeriesCommand::Live);
/// this trait only manages subscriptions.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Starts pushes for a symbol at a resolution.
    async fn subscribe(&self, symbol: &str, resolution: Resolution) -> Result<(), BarstreamError>;

    /// Stops pushes for a symbol at a resolution.
    async fn unsubscribe(&self, symbol: &str, resolution: Resolution)
    -> Result<(), BarstreamError>;
}

/// History source serving a fixed set of bars for any request.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    bars: Vec<RawObservation>,
}

impl StaticHistory {
    /// Creates a source that always returns `bars`.
    #[must_use]
    pub const fn new(bars: Vec<RawObservation>) -> Self {
        Self { bars }
    }
}

#[async_trait]
impl HistorySource for StaticHistory {
    async fn fetch(&self, _request: &HistoryRequest) -> Result<Vec<RawObservation>, BarstreamError> {
        Ok(self.bars.clone())
    }
}

/// Live feed that accepts every subscription and records the calls.
#[derive(Debug, Default)]
pub struct RecordingFeed {
    calls: Mutex<Vec<FeedCall>>,
}

/// A subscription call seen by [`RecordingFeed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCall {
    /// A subscribe call.
    Subscribe(String, Resolution),
    /// An unsubscribe call.
    Unsubscribe(String, Resolution),
}

impl RecordingFeed {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<FeedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: FeedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl LiveFeed for RecordingFeed {
    async fn subscribe(&self, symbol: &str, resolution: Resolution) -> Result<(), BarstreamError> {
        self.record(FeedCall::Subscribe(symbol.to_string(), resolution));
        Ok(())
    }

    async fn unsubscribe(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<(), BarstreamError> {
        self.record(FeedCall::Unsubscribe(symbol.to_string(), resolution));
        Ok(())
    }
}
