//! Replay command implementation.
//!
//! Loads a recorded history, applies recorded live pushes in order through a
//! [`SeriesSession`], and writes either the final display series or every
//! live update.

use anyhow::{Context, Result, bail};
use barstream_lib::prelude::*;
use barstream_lib::{OutputFormat, RenkoConfig, SeriesConfig, SessionConfig};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

use crate::display::{Rows, parse_brick_size, parse_mode, resolve_format, write_rows};
use crate::feed::{FileHistory, ReplayFeed, read_live};

/// Parsed `replay` arguments.
pub(crate) struct ReplayOptions {
    pub(crate) history: PathBuf,
    pub(crate) live: Option<PathBuf>,
    pub(crate) resolution: String,
    pub(crate) mode: String,
    pub(crate) brick_size: Option<String>,
    pub(crate) format: Option<OutputFormat>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) deltas: bool,
    pub(crate) close_line: bool,
    pub(crate) quiet: bool,
}

/// Everything the session emitted, folded for output.
#[derive(Default)]
struct Replayed {
    last_series: Option<DisplaySeries>,
    upserts: Vec<Bar>,
    bricks: Vec<RenkoBrick>,
}

impl Replayed {
    fn apply(&mut self, event: SeriesEvent, quiet: bool) {
        match event {
            SeriesEvent::Replace(series) => self.last_series = Some(series),
            SeriesEvent::Delta(DisplayDelta::Upsert(bar)) => self.upserts.push(bar),
            SeriesEvent::Delta(DisplayDelta::Bricks(bricks)) => self.bricks.extend(bricks),
            SeriesEvent::Delta(DisplayDelta::Unchanged) => {}
            SeriesEvent::Status(status) => {
                if !quiet {
                    eprintln!("{status}");
                }
            }
        }
    }
}

/// Replay a recorded feed through a session and write the result.
pub(crate) async fn replay(options: ReplayOptions) -> Result<()> {
    let registry = ResolutionRegistry::global();
    let resolution = registry
        .get(&options.resolution)
        .with_context(|| format!("Unknown resolution: {}", options.resolution))?
        .resolution();
    let mode = parse_mode(&options.mode)?;

    let mut series = SeriesConfig::default().with_display_mode(mode);
    if let Some(size) = options.brick_size.as_deref() {
        series = series.with_renko(RenkoConfig::new(parse_brick_size(size)?));
    }

    let live = match options.live.as_deref() {
        Some(path) => read_live(path)
            .with_context(|| format!("Failed to read live pushes from {}", path.display()))?,
        None => Vec::new(),
    };
    info!(%resolution, %mode, pushes = live.len(), "starting replay");

    let (events_tx, mut events_rx) = mpsc::channel(256);
    let quiet = options.quiet;
    let collector = tokio::spawn(async move {
        let mut replayed = Replayed::default();
        while let Some(event) = events_rx.recv().await {
            replayed.apply(event, quiet);
        }
        replayed
    });

    let mut session = SeriesSession::new(
        registry,
        FileHistory::new(options.history.clone()),
        ReplayFeed,
        SessionConfig::default().with_series(series),
        events_tx,
    );

    // Re-selecting the mode at the end emits the final series as one replacement.
    let commands = std::iter::once(SeriesCommand::ChangeResolution(options.resolution.clone()))
        .chain(live.into_iter().map(move |observation| SeriesCommand::Live {
            resolution,
            observation,
        }))
        .chain(std::iter::once(SeriesCommand::ChangeDisplayMode(mode)));
    session.drive(futures::stream::iter(commands)).await?;
    session.shutdown().await;
    drop(session);

    let replayed = collector.await.context("Event collector failed")?;
    let Some(last_series) = replayed.last_series else {
        bail!("No history loaded from {}", options.history.display());
    };

    let line;
    let rows = if options.deltas {
        match mode {
            DisplayMode::Renko => Rows::Bricks(&replayed.bricks),
            DisplayMode::Candlestick | DisplayMode::HeikinAshi => Rows::Bars(&replayed.upserts),
        }
    } else if options.close_line {
        line = last_series.close_line();
        Rows::Line(&line)
    } else {
        match &last_series {
            DisplaySeries::Candles(bars) | DisplaySeries::HeikinAshi(bars) => Rows::Bars(bars),
            DisplaySeries::Renko(bricks) => Rows::Bricks(bricks),
        }
    };

    let format = resolve_format(options.format, options.output.as_deref());
    write_rows(&rows, options.output.as_deref(), format)?;
    if let Some(path) = &options.output {
        info!(path = %path.display(), %format, "output written");
    }
    Ok(())
}
