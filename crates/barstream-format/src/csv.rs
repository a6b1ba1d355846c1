//! CSV output format.

use barstream_transform::RenkoBrick;
use barstream_types::{Bar, LinePoint};
use chrono::DateTime;
use std::io::Write;

use crate::{FormatError, Formatter};

/// Renders epoch seconds as RFC 3339, or empty when out of range.
fn iso(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// CSV formatter.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFormatter {
    /// Creates a comma-separated formatter with a header row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Creates a tab-separated formatter.
    #[must_use]
    pub const fn tsv() -> Self {
        Self::new().with_delimiter('\t')
    }
}

impl Formatter for CsvFormatter {
    fn write_bars<W: Write + Send>(&self, bars: &[Bar], mut writer: W) -> Result<(), FormatError> {
        let d = self.delimiter;
        if self.include_header {
            writeln!(writer, "time{d}datetime{d}open{d}high{d}low{d}close{d}volume")?;
        }
        for bar in bars {
            writeln!(
                writer,
                "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                bar.time,
                iso(bar.time),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            )?;
        }
        Ok(())
    }

    fn write_bricks<W: Write + Send>(
        &self,
        bricks: &[RenkoBrick],
        mut writer: W,
    ) -> Result<(), FormatError> {
        let d = self.delimiter;
        if self.include_header {
            writeln!(
                writer,
                "time{d}source_time{d}source_datetime{d}direction{d}open{d}high{d}low{d}close{d}volume"
            )?;
        }
        for brick in bricks {
            writeln!(
                writer,
                "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                brick.time,
                brick.source_time,
                iso(brick.source_time),
                brick.direction,
                brick.open,
                brick.high,
                brick.low,
                brick.close,
                brick.volume
            )?;
        }
        Ok(())
    }

    fn write_line<W: Write + Send>(
        &self,
        points: &[LinePoint],
        mut writer: W,
    ) -> Result<(), FormatError> {
        let d = self.delimiter;
        if self.include_header {
            writeln!(writer, "time{d}value")?;
        }
        for point in points {
            writeln!(writer, "{}{d}{}", point.time, point.value)?;
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        if self.delimiter == '\t' { "tsv" } else { "csv" }
    }
}
