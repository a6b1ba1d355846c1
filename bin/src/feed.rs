//! File-backed collaborators used by `replay`.

use async_trait::async_trait;
use barstream_lib::prelude::*;
use barstream_lib::HistoryResponse;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serves a recorded historical response for every request.
#[derive(Debug)]
pub(crate) struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl HistorySource for FileHistory {
    async fn fetch(&self, request: &HistoryRequest) -> Result<Vec<RawObservation>> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let mut bars = HistoryResponse::from_json(&text)?.into_bars();
        // A live source honors countback; trim the recording the same way.
        let keep = request.countback as usize;
        if keep > 0 && bars.len() > keep {
            bars.drain(..bars.len() - keep);
        }
        info!(path = %self.path.display(), bars = bars.len(), %request, "history loaded from file");
        Ok(bars)
    }
}

/// Live feed that only logs subscription changes; pushes come from a file.
#[derive(Debug, Default)]
pub(crate) struct ReplayFeed;

#[async_trait]
impl LiveFeed for ReplayFeed {
    async fn subscribe(&self, symbol: &str, resolution: Resolution) -> Result<()> {
        debug!(symbol, %resolution, "subscribe");
        Ok(())
    }

    async fn unsubscribe(&self, symbol: &str, resolution: Resolution) -> Result<()> {
        debug!(symbol, %resolution, "unsubscribe");
        Ok(())
    }
}

/// Reads live pushes from a JSON array or NDJSON file.
pub(crate) fn read_live(path: &Path) -> anyhow::Result<Vec<RawObservation>> {
    let text = std::fs::read_to_string(path)?;
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(&text)?);
    }
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
        .collect()
}
