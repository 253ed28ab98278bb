//! Schema cleaning: numeric coercion and canonical rate labels

use crate::error::RatesError;
use crate::types::{format_dmy, Observation, ObservationBatch, RateKind, RawBatch};

/// Outcome of cleaning one normalized batch
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Rows kept
    pub kept: usize,
    /// Rows whose value was an empty cell, kept as gaps
    pub gaps: usize,
    /// Rows dropped because the value was not numeric
    pub rejected: Vec<RatesError>,
}

/// Coerce values and relabel rates for a source kind.
///
/// Unparsable values drop their row; the count is logged.
pub fn clean(batch: RawBatch, kind: RateKind) -> ObservationBatch {
    clean_with_report(batch, kind).0
}

/// Same as [`clean`], also returning what was dropped.
pub fn clean_with_report(batch: RawBatch, kind: RateKind) -> (ObservationBatch, CleanReport) {
    let mut report = CleanReport::default();
    let mut rows = Vec::with_capacity(batch.len());

    for raw in batch {
        let value = match parse_value(&raw.value) {
            Ok(value) => value,
            Err(()) => {
                report.rejected.push(RatesError::MalformedValue {
                    rate: raw.rate,
                    date: format_dmy(raw.date),
                    value: raw.value,
                });
                continue;
            }
        };
        if value.is_none() {
            report.gaps += 1;
        }
        rows.push(Observation::new(raw.date, value, canonical_label(&raw.rate, kind)));
    }

    report.kept = rows.len();
    if !report.rejected.is_empty() {
        log::warn!(
            "{}: dropped {} rows with non-numeric values",
            kind,
            report.rejected.len()
        );
        for err in &report.rejected {
            log::debug!("{}", err);
        }
    }

    (ObservationBatch::new(rows), report)
}

/// Canonical rate identifier for a source label
pub fn canonical_label(label: &str, kind: RateKind) -> String {
    match kind {
        RateKind::Euribor => format!("EUR{}", label.trim().to_uppercase()),
        RateKind::Eonia => "EONIA".to_string(),
        RateKind::Fx => label.to_string(),
    }
}

/// Empty cells are gaps. Anything else must be a finite number.
fn parse_value(cell: &str) -> std::result::Result<Option<f64>, ()> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}
