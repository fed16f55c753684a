//! CSV bar importer feeding the SQLite store.
//!
//! Files are named `<code>.csv` with header
//! `date,open,high,low,close,volume[,ma20,volume_ma5]`; the two trailing
//! columns are optional precomputed averages.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::error::StrategyError;
use crate::domain::series::DailyBar;

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    field: &str,
) -> Result<T, StrategyError>
where
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(index)
        .ok_or_else(|| StrategyError::store(format!("missing {field} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| StrategyError::store(format!("invalid {field} value {raw:?}: {e}")))
}

fn parse_optional(record: &csv::StringRecord, index: usize) -> Option<f64> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Parse one bar file into chronologically sorted bars.
pub fn parse_bar_file(path: &Path) -> Result<Vec<DailyBar>, StrategyError> {
    let content = fs::read_to_string(path).map_err(|e| {
        StrategyError::store(format!("failed to read {}: {e}", path.display()))
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| StrategyError::store(format!("CSV parse error: {e}")))?;

        let date_str: String = parse_field(&record, 0, "date")?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| StrategyError::store(format!("invalid date {date_str:?}: {e}")))?;

        bars.push(DailyBar {
            date,
            open: parse_field(&record, 1, "open")?,
            high: parse_field(&record, 2, "high")?,
            low: parse_field(&record, 3, "low")?,
            close: parse_field(&record, 4, "close")?,
            volume: parse_field(&record, 5, "volume")?,
            ma20: parse_optional(&record, 6),
            volume_ma5: parse_optional(&record, 7),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// Import every `<code>.csv` under `dir` into the store. Returns the
/// number of instruments imported.
pub fn import_bars(adapter: &SqliteAdapter, dir: &Path) -> Result<usize, StrategyError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        StrategyError::store(format!("failed to read directory {}: {e}", dir.display()))
    })?;

    let mut imported = 0;
    for entry in entries {
        let entry = entry.map_err(|e| StrategyError::store(format!("directory entry error: {e}")))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let bars = parse_bar_file(&path)?;
        adapter.insert_bars(code, &bars)?;
        imported += 1;
    }
    Ok(imported)
}
