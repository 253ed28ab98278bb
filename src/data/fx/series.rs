//! Raw FX daily series and its normalization into canonical rows

use super::base::Currency;
use crate::types::{RawBatch, RawObservation};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One day of an FX time series, as published (textual values)
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcQuote {
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl OhlcQuote {
    pub fn new(
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
    ) -> Self {
        Self {
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
        }
    }
}

/// Daily OHLC quotes for one currency pair, ordered by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FxDailySeries {
    quotes: BTreeMap<NaiveDate, OhlcQuote>,
}

impl FxDailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, quote: OhlcQuote) {
        self.quotes.insert(date, quote);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&OhlcQuote> {
        self.quotes.get(&date)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Quotes in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &OhlcQuote)> {
        self.quotes.iter()
    }
}

impl FromIterator<(NaiveDate, OhlcQuote)> for FxDailySeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, OhlcQuote)>>(iter: I) -> Self {
        Self {
            quotes: iter.into_iter().collect(),
        }
    }
}

/// Keep the close of every day, tagged with the quote currency code.
pub fn normalize_fx(series: &FxDailySeries, quote: Currency) -> RawBatch {
    series
        .iter()
        .map(|(date, ohlc)| RawObservation::new(*date, ohlc.close.clone(), quote.as_str()))
        .collect()
}
