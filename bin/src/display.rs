//! Display utilities and output formatting for the barstream CLI.

use anyhow::{Context, Result};
use barstream_lib::prelude::*;
use barstream_lib::{MAX_BRICK_SIZE, validate_brick_sizing};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// What to write: derived candles, Renko bricks or a close-price line.
pub(crate) enum Rows<'a> {
    Bars(&'a [Bar]),
    Bricks(&'a [RenkoBrick]),
    Line(&'a [LinePoint]),
}

fn write_with<F: Formatter, W: Write + Send>(
    formatter: &F,
    rows: &Rows<'_>,
    writer: W,
) -> Result<()> {
    match rows {
        Rows::Bars(bars) => formatter.write_bars(bars, writer)?,
        Rows::Bricks(bricks) => formatter.write_bricks(bricks, writer)?,
        Rows::Line(points) => formatter.write_line(points, writer)?,
    }
    Ok(())
}

/// Writes rows to `output`, or stdout when no path is given.
pub(crate) fn write_rows(
    rows: &Rows<'_>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write + Send> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    match format {
        OutputFormat::Csv => write_with(&CsvFormatter::new(), rows, &mut writer)?,
        OutputFormat::Tsv => write_with(&CsvFormatter::tsv(), rows, &mut writer)?,
        OutputFormat::Json => write_with(&JsonFormatter::new(), rows, &mut writer)?,
        OutputFormat::Ndjson => write_with(&JsonFormatter::ndjson(), rows, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Parses a brick size: a positive number or `atr`.
pub(crate) fn parse_brick_size(s: &str) -> Result<BrickSizing> {
    if s.eq_ignore_ascii_case("atr") {
        return Ok(BrickSizing::Atr);
    }
    let size: f64 = s
        .parse()
        .with_context(|| format!("Invalid brick size: {s}. Use a number or `atr`"))?;
    validate_brick_sizing(BrickSizing::Fixed(size))
        .with_context(|| format!("Brick size must be in (0, {MAX_BRICK_SIZE}]"))
}

/// Picks the output format: explicit flag, then output extension, then CSV.
pub(crate) fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    format
        .or_else(|| output.and_then(OutputFormat::from_path))
        .unwrap_or_default()
}

/// Parses a display mode identifier.
pub(crate) fn parse_mode(s: &str) -> Result<DisplayMode> {
    s.parse::<DisplayMode>().map_err(|_| {
        anyhow::anyhow!("Unknown display mode: {s}. Valid options: candlestick, heikin-ashi, renko")
    })
}
