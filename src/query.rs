//! Range and rate filtering over the historical store

use crate::error::{RatesError, Result};
use crate::store::{write_observations, RateStore};
use crate::types::{format_dmy, parse_dmy, Observation, ObservationBatch, EURIBOR_TENORS};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What each query call dumps to its snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotScope {
    /// The entire, unfiltered store
    #[default]
    FullStore,
    /// Only the rows the query returned
    QueryResult,
}

/// Inclusive date range plus rate allow-list
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuery {
    allow_list: Vec<String>,
    from: NaiveDate,
    to: NaiveDate,
}

impl RateQuery {
    /// Build a query. Without `to`, the range is the single day `from`.
    pub fn new<S: AsRef<str>>(rates: &[S], from: NaiveDate, to: Option<NaiveDate>) -> Self {
        Self {
            allow_list: expand_allow_list(rates),
            from,
            to: to.unwrap_or(from),
        }
    }

    /// Build a query from `dd/mm/yyyy` dates
    pub fn parse<S: AsRef<str>>(rates: &[S], date_from: &str, date_to: Option<&str>) -> Result<Self> {
        let from = parse_dmy(date_from)?;
        let to = date_to.map(parse_dmy).transpose()?;
        Ok(Self::new(rates, from, to))
    }

    /// Upper-cased rate identifiers, with `EURIBOR` expanded to its tenors
    pub fn allow_list(&self) -> &[String] {
        &self.allow_list
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        obs.date >= self.from && obs.date <= self.to && self.allow_list.iter().any(|r| *r == obs.rate)
    }

    /// Matching rows sorted by (Date, Rate)
    pub fn filter(&self, table: &ObservationBatch) -> ObservationBatch {
        let mut result =
            ObservationBatch::new(table.iter().filter(|o| self.matches(o)).cloned().collect());
        result.sort_by_date_rate();
        result
    }
}

/// Upper-case the allow-list and replace `EURIBOR` with its canonical tenors
pub fn expand_allow_list<S: AsRef<str>>(rates: &[S]) -> Vec<String> {
    let mut list: Vec<String> = rates.iter().map(|r| r.as_ref().trim().to_uppercase()).collect();
    if list.iter().any(|r| r == "EURIBOR") {
        list.extend(EURIBOR_TENORS.iter().map(|t| t.to_string()));
    }
    list
}

/// Writes each query's snapshot to a fresh, timestamped file
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "Rates_to_upload".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<prefix>_<unix seconds>.csv`, suffixed with `_<n>` if already taken
    pub fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().timestamp();
        let mut path = self.dir.join(format!("{}_{}.csv", self.prefix, stamp));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}_{}.csv", self.prefix, stamp, n));
            n += 1;
        }
        path
    }

    pub fn write(&self, rows: &[Observation]) -> Result<PathBuf> {
        let path = self.next_path();
        write_observations(&path, rows)?;
        Ok(path)
    }
}

/// Output row with the date rendered as `dd/mm/yyyy`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Value")]
    pub value: Option<f64>,
    #[serde(rename = "Rate")]
    pub rate: String,
}

impl From<&Observation> for QueryRow {
    fn from(obs: &Observation) -> Self {
        Self {
            date: format_dmy(obs.date),
            value: obs.value,
            rate: obs.rate.clone(),
        }
    }
}

/// Rows matched by a query and where its snapshot went
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: ObservationBatch,
    pub snapshot: PathBuf,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows re-serialized for output
    pub fn to_rows(&self) -> Vec<QueryRow> {
        self.rows.iter().map(QueryRow::from).collect()
    }
}

/// Filter the store and write a snapshot according to `scope`.
pub fn run_query(
    store: &RateStore,
    query: &RateQuery,
    snapshots: &SnapshotWriter,
    scope: SnapshotScope,
) -> Result<QueryResult> {
    if !store.exists() {
        return Err(RatesError::DataError(format!(
            "No store at {}",
            store.path().display()
        )));
    }
    if query.from > query.to {
        log::warn!(
            "Query range is empty: {} is after {}",
            format_dmy(query.from),
            format_dmy(query.to)
        );
    }

    let table = store.load()?;
    let rows = query.filter(&table);

    let snapshot = match scope {
        SnapshotScope::FullStore => snapshots.write(table.rows())?,
        SnapshotScope::QueryResult => snapshots.write(rows.rows())?,
    };
    log::info!("Filtered data csv file saved at: {}", snapshot.display());

    Ok(QueryResult { rows, snapshot })
}

/// Filter the store at `store_location` by rates and a `dd/mm/yyyy` date range.
///
/// Every call also dumps the full, unfiltered store into a new file under
/// `snapshot_dir`.
pub fn query<S: AsRef<str>>(
    store_location: &Path,
    rate_allow_list: &[S],
    date_from: &str,
    date_to: Option<&str>,
    snapshot_dir: &Path,
) -> Result<QueryResult> {
    let query = RateQuery::parse(rate_allow_list, date_from, date_to)?;
    run_query(
        &RateStore::new(store_location),
        &query,
        &SnapshotWriter::new(snapshot_dir),
        SnapshotScope::FullStore,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_expand_allow_list() {
        let list = expand_allow_list(&["usd", "Euribor"]);
        assert_eq!(list[0], "USD");
        assert!(list.contains(&"EUR12M".to_string()));
        assert_eq!(list.len(), 2 + EURIBOR_TENORS.len());

        assert_eq!(expand_allow_list(&["gbp"]), vec!["GBP".to_string()]);
    }

    #[test]
    fn test_single_day_range() {
        let query = RateQuery::parse(&["USD"], "02/01/2020", None).unwrap();
        assert_eq!(query.from(), d(2020, 1, 2));
        assert_eq!(query.to(), d(2020, 1, 2));
    }

    #[test]
    fn test_range_compares_dates_not_text() {
        // "15/01/2020" > "02/02/2020" as text, but not as a date
        let query = RateQuery::parse(&["USD"], "15/01/2020", Some("02/02/2020")).unwrap();
        assert!(query.matches(&Observation::new(d(2020, 1, 31), Some(1.0), "USD")));
        assert!(query.matches(&Observation::new(d(2020, 2, 2), Some(1.0), "USD")));
        assert!(!query.matches(&Observation::new(d(2020, 2, 3), Some(1.0), "USD")));
        assert!(!query.matches(&Observation::new(d(2020, 1, 31), Some(1.0), "GBP")));
    }

    #[test]
    fn test_filter_sorts() {
        let table = ObservationBatch::new(vec![
            Observation::new(d(2020, 1, 2), Some(1.0), "USD"),
            Observation::new(d(2020, 1, 1), Some(2.0), "USD"),
            Observation::new(d(2020, 1, 1), Some(3.0), "GBP"),
        ]);
        let query = RateQuery::new(&["USD", "GBP"], d(2020, 1, 1), Some(d(2020, 1, 2)));
        let rows: Vec<QueryRow> = query.filter(&table).iter().map(QueryRow::from).collect();

        assert_eq!(rows[0].rate, "GBP");
        assert_eq!(rows[1].date, "01/01/2020");
        assert_eq!(rows[2].date, "02/01/2020");
    }

    #[test]
    fn test_invalid_date_input() {
        assert!(matches!(
            RateQuery::parse(&["USD"], "2020-01-01", None).unwrap_err(),
            RatesError::InvalidDate(_)
        ));
    }

    #[test]
    fn test_snapshot_paths_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        let first = writer.write(&[]).unwrap();
        let second = writer.write(&[]).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("Rates_to_upload_"));
    }
}
