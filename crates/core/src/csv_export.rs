//! CSV rendering of quote reports
//!
//! Files start with a UTF-8 byte-order mark so spreadsheet applications detect
//! the encoding, use `\n` line endings, and end with a blank line followed by
//! the totals row.

use crate::config::Quoting;
use crate::report::Report;
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const UTF8_BOM: &str = "\u{FEFF}";

/// Error types for CSV export
#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type CsvExportResult<T> = Result<T, CsvExportError>;

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// CSV delimiter character
    pub delimiter: u8,

    /// Field quoting, applied to every row of the file
    pub quoting: Quoting,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self { delimiter: b',', quoting: Quoting::Minimal }
    }
}

impl CsvExportConfig {
    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }
}

fn writer_builder(config: &CsvExportConfig) -> csv::WriterBuilder {
    let quote_style = match config.quoting {
        Quoting::Minimal => csv::QuoteStyle::Necessary,
        Quoting::All => csv::QuoteStyle::Always,
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(config.delimiter)
        .has_headers(false)
        .flexible(true)
        .quote_style(quote_style)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Write a report as CSV
///
/// Layout:
/// - byte-order mark
/// - header row
/// - one row per annotated object
/// - blank line
/// - totals row
pub fn write_report<W: Write>(mut writer: W, report: &Report, config: &CsvExportConfig) -> CsvExportResult<()> {
    writer.write_all(UTF8_BOM.as_bytes())?;

    {
        let mut csv_writer = writer_builder(config).from_writer(&mut writer);
        csv_writer.write_record(report.header())?;
        for fields in report.row_fields() {
            csv_writer.write_record(&fields)?;
        }
        csv_writer.flush()?;
    }

    writer.write_all(b"\n")?;

    {
        let mut csv_writer = writer_builder(config).from_writer(&mut writer);
        csv_writer.write_record(report.totals_fields())?;
        csv_writer.flush()?;
    }

    writer.flush()?;
    Ok(())
}

/// Render a report to a string, byte-order mark included.
pub fn render_report(report: &Report, config: &CsvExportConfig) -> CsvExportResult<String> {
    let mut buffer = Vec::new();
    write_report(&mut buffer, report, config)?;
    // Every field is built from Rust strings, so the buffer is valid UTF-8.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// File name for an export made at `now`: `quote_YYYYMMDD_HHMM.csv`.
pub fn export_file_name(now: &DateTime<Local>) -> String {
    format!("quote_{}.csv", now.format("%Y%m%d_%H%M"))
}

/// Write `report` into `dir` under [`export_file_name`] and return the path.
pub fn export_to_dir(
    dir: &Path,
    report: &Report,
    config: &CsvExportConfig,
    now: &DateTime<Local>,
) -> CsvExportResult<PathBuf> {
    let path = dir.join(export_file_name(now));
    let file = File::create(&path)?;
    write_report(BufWriter::new(file), report, config)?;

    tracing::info!(path = %path.display(), rows = report.rows.len(), "report exported");
    Ok(path)
}
