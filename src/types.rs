//! Core types and constants

use crate::error::{RatesError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the canonical long-format table, in on-disk order
pub const CANONICAL_COLUMNS: [&str; 3] = ["Date", "Value", "Rate"];

/// On-disk and user-facing date format (day/month/year)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Date format used by the rate API time series keys
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical EURIBOR tenor identifiers, as they appear in the store
pub const EURIBOR_TENORS: [&str; 6] = ["EUR1W", "EUR1M", "EUR3M", "EUR6M", "EUR9M", "EUR12M"];

/// Parse a `dd/mm/yyyy` date
pub fn parse_dmy(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| RatesError::InvalidDate(s.to_string()))
}

/// Render a date as `dd/mm/yyyy`
pub fn format_dmy(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Convert an ISO date string such as `2020-05-11` into `11/05/2020`
pub fn format_date(iso: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(iso.trim(), ISO_DATE_FORMAT)
        .map_err(|e| RatesError::ParseError(format!("Invalid ISO date '{}': {}", iso, e)))?;
    Ok(format_dmy(date))
}

/// Source family of a requested rate identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateKind {
    /// Daily FX fixing; the identifier is the quote currency code
    Fx,
    /// Euro Interbank Offered Rate, one series per tenor
    Euribor,
    /// Euro OverNight Index Average, a single overnight series
    Eonia,
}

impl RateKind {
    /// Classify a requested identifier. Anything that is not a known
    /// interest-rate benchmark is treated as an FX quote currency.
    pub fn classify(identifier: &str) -> Self {
        match identifier.trim().to_uppercase().as_str() {
            "EURIBOR" => RateKind::Euribor,
            "EONIA" => RateKind::Eonia,
            _ => RateKind::Fx,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::Fx => "FX",
            RateKind::Euribor => "EURIBOR",
            RateKind::Eonia => "EONIA",
        }
    }

    /// Interest-rate benchmarks are published per year
    pub fn is_benchmark(&self) -> bool {
        matches!(self, RateKind::Euribor | RateKind::Eonia)
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized row whose value has not been coerced yet
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub date: NaiveDate,
    pub value: String,
    pub rate: String,
}

impl RawObservation {
    pub fn new(date: NaiveDate, value: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            date,
            value: value.into(),
            rate: rate.into(),
        }
    }
}

/// Output of the source normalizers
pub type RawBatch = Vec<RawObservation>;

/// Canonical rate observation: `{Date, Value, Rate}`
///
/// A `None` value is a data gap. Gaps are kept as such and never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub rate: String,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>, rate: impl Into<String>) -> Self {
        Self {
            date,
            value,
            rate: rate.into(),
        }
    }

    /// Deduplication key
    pub fn key(&self) -> (NaiveDate, &str) {
        (self.date, self.rate.as_str())
    }

    /// Render as on-disk CSV fields
    pub fn to_record(&self) -> [String; 3] {
        [
            format_dmy(self.date),
            self.value.map(|v| v.to_string()).unwrap_or_default(),
            self.rate.clone(),
        ]
    }
}

/// A table of observations together with the column schema it was built with
///
/// Batches produced by the pipeline always carry [`CANONICAL_COLUMNS`]. Batches
/// loaded from foreign CSV files keep the header they were read with, which is
/// what the store merger checks before accepting them.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationBatch {
    columns: Vec<String>,
    rows: Vec<Observation>,
}

impl ObservationBatch {
    /// Create a batch with the canonical schema
    pub fn new(rows: Vec<Observation>) -> Self {
        Self {
            columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Create a batch with an explicit column schema
    pub fn with_columns(columns: Vec<String>, rows: Vec<Observation>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the schema is exactly `Date,Value,Rate`
    pub fn has_canonical_schema(&self) -> bool {
        self.columns.len() == CANONICAL_COLUMNS.len()
            && self
                .columns
                .iter()
                .zip(CANONICAL_COLUMNS.iter())
                .all(|(a, b)| a == b)
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.rows.iter()
    }

    pub fn push(&mut self, observation: Observation) {
        self.rows.push(observation);
    }

    /// Stable sort ascending by (Date, Rate). Empty rate labels sort first.
    pub fn sort_by_date_rate(&mut self) {
        self.rows
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.rate.cmp(&b.rate)));
    }

    /// Distinct rate identifiers, sorted
    pub fn rates(&self) -> Vec<String> {
        let mut rates: Vec<String> = self.rows.iter().map(|o| o.rate.clone()).collect();
        rates.sort();
        rates.dedup();
        rates
    }

    /// Earliest and latest dates present
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.iter().map(|o| o.date).min()?;
        let last = self.rows.iter().map(|o| o.date).max()?;
        Some((first, last))
    }
}

impl Default for ObservationBatch {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a ObservationBatch {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
