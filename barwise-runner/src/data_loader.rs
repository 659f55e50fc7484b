//! CSV bar loading into a [`BarTable`].
//!
//! Expected layout: a date column first (`Date`, `Datetime` or `Timestamp`),
//! then one column per series named by the table convention
//! (`MSFT_Open`, `MSFT_Close`, `MSFT_Adj Close`, ...). Empty cells and
//! `NaN`/`null` load as missing values. Several files may be merged into one
//! table; overlapping cells keep the first non-missing value.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use barwise_core::table::{BarTable, ColumnKey};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

const DATE_HEADERS: [&str; 3] = ["date", "datetime", "timestamp"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("first column must be a date column, found '{found}'")]
    MissingDateColumn { found: String },

    #[error("row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}, column '{column}': invalid number '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("no bars loaded")]
    Empty,
}

/// Parse `%Y-%m-%d`, `%Y-%m-%d %H:%M:%S` or the `T`-separated form.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}

/// Load bars from any CSV reader.
pub fn load_bars_csv<R: Read>(reader: R) -> Result<BarTable, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let first = headers.get(0).unwrap_or_default();
    if !DATE_HEADERS.iter().any(|h| first.eq_ignore_ascii_case(h)) {
        return Err(LoadError::MissingDateColumn {
            found: first.to_string(),
        });
    }
    let keys: Vec<ColumnKey> = headers.iter().skip(1).map(ColumnKey::from).collect();

    let mut table = BarTable::new();
    let mut cells: Vec<(&ColumnKey, f64)> = Vec::with_capacity(keys.len());
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_date).ok_or_else(|| LoadError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        cells.clear();
        for (key, raw) in keys.iter().zip(record.iter().skip(1)) {
            let value = parse_cell(raw).ok_or_else(|| LoadError::InvalidNumber {
                row,
                column: key.to_string(),
                value: raw.to_string(),
            })?;
            if !value.is_nan() {
                cells.push((key, value));
            }
        }
        table.merge_row(timestamp, cells.iter().copied());
    }

    if table.is_empty() {
        return Err(LoadError::Empty);
    }
    tracing::debug!(rows = table.len(), columns = keys.len(), "bars_loaded");
    Ok(table)
}

pub fn load_bars_file(path: &Path) -> Result<BarTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_bars_csv(file)?;
    tracing::info!(path = %path.display(), rows = table.len(), "bars_file_loaded");
    Ok(table)
}

/// Load and merge several files (typically one per symbol).
pub fn load_bars_files<P: AsRef<Path>>(paths: &[P]) -> Result<BarTable, LoadError> {
    let mut merged = BarTable::new();
    for path in paths {
        let table = load_bars_file(path.as_ref())?;
        merged.merge_table(&table);
    }
    if merged.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(merged)
}
