//! Historical rate store
//!
//! A CSV file with header `Date,Value,Rate` (dates as `dd/mm/yyyy`) that
//! accumulates every observation ever gathered. The store is the source of
//! truth once written: when an incoming row shares its (Date, Rate) key with a
//! stored row, the stored value is kept.
//!
//! Single process, single writer. Replacing the file goes through a temporary
//! file in the same directory followed by a rename, so readers never observe
//! a half-written store.

use crate::error::{RatesError, Result};
use crate::types::{parse_dmy, Observation, ObservationBatch, CANONICAL_COLUMNS};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use hashbrown::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Summary of the store contents
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub rows: usize,
    pub rates: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Persistent, deduplicated table of observations
#[derive(Debug, Clone)]
pub struct RateStore {
    path: PathBuf,
}

impl RateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create a header-only store if none exists. Returns whether a file was created.
    pub fn ensure_exists(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        write_observations(&self.path, &[])?;
        log::info!("New file created at: {}", self.path.display());
        Ok(true)
    }

    /// Column names of the stored table
    pub fn read_header(&self) -> Result<Vec<String>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| {
                RatesError::DataError(format!(
                    "Failed to open store {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        Ok(reader.headers()?.iter().map(|h| h.to_string()).collect())
    }

    /// Load the whole store
    pub fn load(&self) -> Result<ObservationBatch> {
        read_table(&self.path)
    }

    /// Merge a batch into the store, keeping stored values on key collisions.
    ///
    /// Fails with [`RatesError::SchemaMismatch`] without touching the file when
    /// the batch's columns differ from the store's. Returns the merged table.
    pub fn merge(&self, incoming: &ObservationBatch) -> Result<ObservationBatch> {
        self.ensure_exists()?;

        let header = self.read_header()?;
        if header.as_slice() != incoming.columns() {
            log::error!(
                "Dataframes cannot be concatenated. local file columns: {}, incoming columns: {}",
                header.len(),
                incoming.columns().len()
            );
            return Err(RatesError::SchemaMismatch {
                store_columns: header.len(),
                incoming_columns: incoming.columns().len(),
            });
        }

        let existing = self.load()?;
        let stored_keys = existing.len();
        let merged = dedup_first(existing.into_rows().into_iter().chain(incoming.iter().cloned()));
        let stored_keys = stored_keys.min(merged.len());

        write_observations(&self.path, &merged)?;
        log::info!(
            "File updated: {} ({} rows, {} new)",
            self.path.display(),
            merged.len(),
            merged.len().saturating_sub(stored_keys)
        );

        Ok(ObservationBatch::new(merged))
    }

    /// Merge an external CSV (for example an earlier snapshot) into the store
    pub fn import_file(&self, path: &Path) -> Result<ObservationBatch> {
        let (incoming, rejected) = read_table_with_report(path)?;
        log::info!(
            "Importing {} rows from {} ({} dropped)",
            incoming.len(),
            path.display(),
            rejected.len()
        );
        self.merge(&incoming)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let table = self.load()?;
        let (first_date, last_date) = match table.date_range() {
            Some((first, last)) => (Some(first), Some(last)),
            None => (None, None),
        };
        Ok(StoreStats {
            rows: table.len(),
            rates: table.rates(),
            first_date,
            last_date,
        })
    }
}

/// Merge `incoming` into the store at `store_location`
pub fn merge(store_location: &Path, incoming: &ObservationBatch) -> Result<ObservationBatch> {
    RateStore::new(store_location).merge(incoming)
}

/// Keep the first row seen for each (Date, Rate) key, preserving order
pub fn dedup_first<I>(rows: I) -> Vec<Observation>
where
    I: IntoIterator<Item = Observation>,
{
    let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
    rows.into_iter()
        .filter(|obs| seen.insert((obs.date, obs.rate.clone())))
        .collect()
}

/// Read a `Date,Value,Rate` style CSV.
///
/// Columns are located by name and the file's own header is kept as the
/// batch schema. `Value` and `Rate` may be absent; `Date` may not. Rows with
/// a non-numeric value are dropped and their count logged.
pub fn read_table(path: &Path) -> Result<ObservationBatch> {
    read_table_with_report(path).map(|(table, _)| table)
}

/// Same as [`read_table`], also returning the dropped rows.
pub fn read_table_with_report(path: &Path) -> Result<(ObservationBatch, Vec<RatesError>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| RatesError::DataError(format!("Failed to open CSV {}: {}", path.display(), e)))?;

    let headers = reader.headers()?.clone();
    let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

    let date_idx = find_column(&headers, "Date")
        .ok_or_else(|| RatesError::DataError(format!("Column 'Date' not found in {}", path.display())))?;
    let value_idx = find_column(&headers, "Value");
    let rate_idx = find_column(&headers, "Rate");

    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let date_str = record.get(date_idx).unwrap_or("");
        let date = parse_dmy(date_str).map_err(|_| {
            RatesError::DataError(format!(
                "Invalid date '{}' on line {} of {}",
                date_str,
                line + 2,
                path.display()
            ))
        })?;

        let rate = rate_idx
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string();

        let raw_value = value_idx.and_then(|i| record.get(i)).unwrap_or("").trim();
        let value = if raw_value.is_empty() {
            None
        } else {
            match raw_value.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    rejected.push(RatesError::MalformedValue {
                        rate,
                        date: date_str.to_string(),
                        value: raw_value.to_string(),
                    });
                    continue;
                }
            }
        };

        rows.push(Observation::new(date, value, rate));
    }

    if !rejected.is_empty() {
        log::warn!(
            "{}: dropped {} rows with non-numeric values",
            path.display(),
            rejected.len()
        );
        for err in &rejected {
            log::debug!("{}", err);
        }
    }

    Ok((ObservationBatch::with_columns(columns, rows), rejected))
}

/// Atomically write observations as a canonical CSV
pub fn write_observations(path: &Path, rows: &[Observation]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = csv::Writer::from_writer(&mut tmp);
        writer.write_record(CANONICAL_COLUMNS)?;
        for obs in rows {
            writer.write_record(obs.to_record())?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| RatesError::IoError(e.error))?;
    Ok(())
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}
