//! Info command implementation.

use anyhow::{Context, Result};
use barstream_lib::prelude::*;
use barstream_lib::{DEFAULT_LOOKBACK, ticks_per_bar};

/// Show the table entry for one resolution and the request it produces.
pub(crate) fn show_info(id: &str) -> Result<()> {
    let registry = ResolutionRegistry::global();
    let spec = registry
        .get(id)
        .with_context(|| format!("Unknown resolution: {id}"))?;
    let resolution = spec.resolution();

    println!("Resolution:    {}", spec.display_name());
    println!("ID:            {resolution}");
    println!("Symbol:        {}", spec.symbol());
    println!("History depth: {} bars", spec.history_depth());

    match resolution.seconds() {
        Some(secs) => println!("Bar duration:  {secs}s"),
        None => println!(
            "Ticks per bar: {} (target {})",
            ticks_per_bar(resolution),
            resolution.tick_target().unwrap_or_default()
        ),
    }

    let request = HistoryRequest::lookback(
        spec.symbol(),
        resolution,
        spec.history_depth(),
        chrono::Utc::now(),
        DEFAULT_LOOKBACK,
    )?;
    println!("\nHistory request: {request}");

    Ok(())
}
