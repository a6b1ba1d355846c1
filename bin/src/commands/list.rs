//! List command implementation.

use anyhow::Result;
use barstream_lib::prelude::*;
use barstream_lib::ticks_per_bar;

/// List configured resolutions, optionally only tick-count ones.
pub(crate) fn list_resolutions(ticks_only: bool) -> Result<()> {
    let registry = ResolutionRegistry::global();

    let specs: Vec<_> = if ticks_only {
        registry.ticks().collect()
    } else {
        registry.all().collect()
    };

    println!(
        "{:<8} {:<14} {:>7} {:>10} {:<10}",
        "ID", "NAME", "DEPTH", "TICKS/BAR", "SYMBOL"
    );
    println!("{}", "-".repeat(53));

    for spec in &specs {
        let threshold = if spec.resolution().is_tick() {
            ticks_per_bar(spec.resolution()).to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:<8} {:<14} {:>7} {:>10} {:<10}",
            spec.resolution(),
            spec.display_name(),
            spec.history_depth(),
            threshold,
            spec.symbol()
        );
    }

    println!("\nTotal: {} resolutions", specs.len());
    Ok(())
}
