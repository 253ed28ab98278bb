//! Interest-rate benchmark publications (EURIBOR, EONIA)
//!
//! The benchmark provider publishes one CSV per benchmark and year, laid out
//! wide: the first row holds the publication dates, every following row is a
//! tenor with one value per date, and the file ends with non-data rows. The
//! rows to discard are described by a [`RateTableLayout`] per benchmark so a
//! change in the publication format is reported instead of misparsed.

use crate::error::{RatesError, Result};
use crate::types::{RateKind, RawBatch, RawObservation};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::fmt;

/// Interest-rate benchmarks published as yearly CSV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Benchmark {
    Euribor,
    Eonia,
}

impl Benchmark {
    /// Benchmark for a rate kind, `None` for FX
    pub fn from_kind(kind: RateKind) -> Option<Self> {
        match kind {
            RateKind::Euribor => Some(Benchmark::Euribor),
            RateKind::Eonia => Some(Benchmark::Eonia),
            RateKind::Fx => None,
        }
    }

    pub fn kind(&self) -> RateKind {
        match self {
            Benchmark::Euribor => RateKind::Euribor,
            Benchmark::Eonia => RateKind::Eonia,
        }
    }

    /// Name used in publication file names
    pub fn as_str(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Parsing rules for the current publication format
    pub fn layout(&self) -> &'static RateTableLayout {
        match self {
            Benchmark::Euribor => &EURIBOR_LAYOUT_V1,
            Benchmark::Eonia => &EONIA_LAYOUT_V1,
        }
    }

    /// Publication file name for a year, e.g. `hist_EURIBOR_2020.csv`
    pub fn file_name(&self, year: i32) -> String {
        format!("hist_{}_{}.csv", self.as_str(), year)
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A non-data row expected at the end of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingRow {
    /// Empty line left by the CSV generator
    Blank,
    /// Row whose label contains the given text (case-insensitive)
    Labelled(&'static str),
}

impl TrailingRow {
    fn matches(&self, cells: &[String]) -> bool {
        match self {
            TrailingRow::Blank => cells.iter().all(|c| c.is_empty()),
            TrailingRow::Labelled(needle) => cells
                .first()
                .map(|label| label.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for TrailingRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrailingRow::Blank => write!(f, "blank row"),
            TrailingRow::Labelled(needle) => write!(f, "row labelled '{}'", needle),
        }
    }
}

/// Versioned parsing rules for a wide benchmark publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTableLayout {
    pub name: &'static str,
    pub version: u32,
    /// Label inserted in front of the date header
    pub first_column_label: &'static str,
    /// Rows dropped from the end of the file, last row first
    pub trailing_rows: &'static [TrailingRow],
    /// Accepted formats for the date header cells
    pub date_formats: &'static [&'static str],
}

impl RateTableLayout {
    pub fn id(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }
}

pub const EURIBOR_LAYOUT_V1: RateTableLayout = RateTableLayout {
    name: "EURIBOR",
    version: 1,
    first_column_label: "Rate",
    trailing_rows: &[TrailingRow::Blank],
    date_formats: &["%d/%m/%Y", "%Y-%m-%d"],
};

pub const EONIA_LAYOUT_V1: RateTableLayout = RateTableLayout {
    name: "EONIA",
    version: 1,
    first_column_label: "Rate",
    trailing_rows: &[TrailingRow::Blank, TrailingRow::Labelled("volume")],
    date_formats: &["%d/%m/%Y", "%Y-%m-%d"],
};

/// Reshape a raw benchmark CSV into one row per tenor and date.
pub fn normalize_rate_table(raw_csv: &str, benchmark: Benchmark) -> Result<RawBatch> {
    normalize_with_layout(raw_csv, benchmark.layout())
}

/// Reshape a raw benchmark CSV using explicit layout rules.
///
/// Rows are emitted date by date, tenors in file order within a date.
pub fn normalize_with_layout(raw_csv: &str, layout: &RateTableLayout) -> Result<RawBatch> {
    let mismatch = |detail: String| RatesError::LayoutMismatch {
        source_name: layout.id(),
        detail,
    };

    let mut rows = raw_csv
        .split('\n')
        .map(split_row)
        .collect::<Result<Vec<Vec<String>>>>()?;

    for rule in layout.trailing_rows {
        let row = rows
            .pop()
            .ok_or_else(|| mismatch(format!("expected trailing {}, found end of file", rule)))?;
        if !rule.matches(&row) {
            return Err(mismatch(format!(
                "expected trailing {}, found '{}'",
                rule,
                row.join(",")
            )));
        }
    }

    if rows.is_empty() {
        return Err(mismatch("missing date header row".to_string()));
    }
    let mut header = rows.remove(0);
    if header.iter().all(|c| c.is_empty()) {
        return Err(mismatch("empty date header row".to_string()));
    }
    header.insert(0, layout.first_column_label.to_string());

    let dates = header[1..]
        .iter()
        .map(|cell| {
            parse_header_date(cell, layout.date_formats)
                .ok_or_else(|| mismatch(format!("header cell '{}' is not a date", cell)))
        })
        .collect::<Result<Vec<NaiveDate>>>()?;

    let mut tenors: Vec<(String, Vec<String>)> = Vec::with_capacity(rows.len());
    for row in rows {
        if row.iter().all(|c| c.is_empty()) {
            log::debug!("{}: skipping blank row inside table", layout.id());
            continue;
        }
        let mut cells = row.into_iter();
        let label = cells.next().unwrap_or_default();
        let mut values: Vec<String> = cells.collect();
        if values.len() > dates.len() {
            return Err(mismatch(format!(
                "row '{}' has {} values for {} dates",
                label,
                values.len(),
                dates.len()
            )));
        }
        // trailing gaps were stripped with the artifact commas
        values.resize(dates.len(), String::new());
        tenors.push((label, values));
    }

    let mut batch = Vec::with_capacity(tenors.len() * dates.len());
    for (col, date) in dates.iter().enumerate() {
        for (label, values) in &tenors {
            batch.push(RawObservation::new(*date, values[col].clone(), label.clone()));
        }
    }

    log::debug!(
        "{}: reshaped {} tenors x {} dates",
        layout.id(),
        tenors.len(),
        dates.len()
    );
    Ok(batch)
}

/// Split one line into trimmed cells, honouring quoted cells, and remove the
/// leading/trailing empty cells the publication generator emits.
///
/// Lines are split one at a time because a blank line is a meaningful
/// trailing row here, and the csv reader skips blank lines.
fn split_row(line: &str) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.trim_end_matches('\r').as_bytes());

    let mut record = StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Vec::new());
    }

    let cells: Vec<String> = record.iter().map(|cell| cell.trim().to_string()).collect();
    let start = cells.iter().position(|c| !c.is_empty()).unwrap_or(cells.len());
    let end = cells.iter().rposition(|c| !c.is_empty()).map_or(start, |i| i + 1);
    Ok(cells[start..end].to_vec())
}

fn parse_header_date(cell: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EURIBOR_CSV: &str = ",02/01/2020,03/01/2020,06/01/2020,\n\
                               1w,-0.452,-0.453,-0.451,\n\
                               1m,-0.441,-0.440,-0.439,\n\
                               12m,-0.249,-0.253,-0.251,\n";

    const EONIA_CSV: &str = ",02/01/2020,03/01/2020,\r\n\
                             ON,-0.449,-0.455,\r\n\
                             Volume ON (in mln euro),3321,2764,\r\n";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_euribor_reshape_is_tenors_times_dates() {
        let batch = normalize_rate_table(EURIBOR_CSV, Benchmark::Euribor).unwrap();
        assert_eq!(batch.len(), 3 * 3);

        assert_eq!(batch[0], RawObservation::new(d(2020, 1, 2), "-0.452", "1w"));
        assert_eq!(batch[1], RawObservation::new(d(2020, 1, 2), "-0.441", "1m"));
        assert_eq!(batch[2], RawObservation::new(d(2020, 1, 2), "-0.249", "12m"));
        assert_eq!(batch[8], RawObservation::new(d(2020, 1, 6), "-0.251", "12m"));
    }

    #[test]
    fn test_eonia_drops_volume_row() {
        let batch = normalize_rate_table(EONIA_CSV, Benchmark::Eonia).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|r| r.rate == "ON"));
        assert_eq!(batch[1].value, "-0.455");
    }

    #[test]
    fn test_eonia_without_volume_row_fails_loudly() {
        let csv = ",02/01/2020,\nON,-0.449,\n";
        let err = normalize_rate_table(csv, Benchmark::Eonia).unwrap_err();
        assert!(matches!(err, RatesError::LayoutMismatch { .. }));
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_missing_trailing_newline_is_reported() {
        let csv = ",02/01/2020,\n1w,-0.452,";
        let err = normalize_rate_table(csv, Benchmark::Euribor).unwrap_err();
        assert!(matches!(err, RatesError::LayoutMismatch { .. }));
    }

    #[test]
    fn test_trailing_gap_is_padded() {
        let csv = ",02/01/2020,03/01/2020,\n1w,-0.452,\n";
        let batch = normalize_rate_table(csv, Benchmark::Euribor).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], RawObservation::new(d(2020, 1, 3), "", "1w"));
    }

    #[test]
    fn test_bad_header_date_is_not_dropped_silently() {
        let csv = ",02/01/2020,not-a-date,\n1w,-0.452,-0.453,\n";
        assert!(normalize_rate_table(csv, Benchmark::Euribor).is_err());
    }

    #[test]
    fn test_too_many_values() {
        let csv = ",02/01/2020,\n1w,-0.452,-0.453,\n";
        assert!(normalize_rate_table(csv, Benchmark::Euribor).is_err());
    }

    #[test]
    fn test_quoted_cells_keep_their_commas() {
        let csv = ",\"02/01/2020\",03/01/2020,\n\"1w, fixed\",-0.452,\"-0.453\",\n\n";
        let batch = normalize_rate_table(csv, Benchmark::Euribor).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], RawObservation::new(d(2020, 1, 2), "-0.452", "1w, fixed"));
        assert_eq!(batch[1], RawObservation::new(d(2020, 1, 3), "-0.453", "1w, fixed"));
    }

    #[test]
    fn test_split_row_strips_artifact_cells_only() {
        assert_eq!(split_row(",a,,b,\r").unwrap(), vec!["a", "", "b"]);
        assert_eq!(split_row("").unwrap(), Vec::<String>::new());
        assert_eq!(split_row(",,").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_benchmark_file_name() {
        assert_eq!(Benchmark::Euribor.file_name(2020), "hist_EURIBOR_2020.csv");
        assert_eq!(Benchmark::from_kind(RateKind::Fx), None);
        assert_eq!(Benchmark::Eonia.layout().id(), "EONIA v1");
    }
}
