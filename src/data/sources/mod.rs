//! External data sources
//!
//! This module provides the two raw-data boundaries of the pipeline:
//! - Alpha Vantage: daily FX time series as JSON
//! - EMMI: yearly EURIBOR/EONIA publications as CSV
//! - Directory replay: previously saved payloads, for offline runs and tests
//!
//! Sources only move bytes. A non-success status is returned as data, not as
//! an error, so the pipeline decides whether to skip or abort.

pub mod alpha_vantage;
#[cfg(feature = "http")]
pub mod emmi;
pub mod replay;

pub use alpha_vantage::{parse_fx_daily, OutputSize};
#[cfg(feature = "http")]
pub use alpha_vantage::AlphaVantageClient;
#[cfg(feature = "http")]
pub use emmi::EmmiClient;
pub use replay::DirectorySource;

use crate::data::benchmarks::Benchmark;
use crate::data::fx::CurrencyPair;
use crate::error::Result;

/// Status and body of one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, String::new())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Daily FX fixings provider
pub trait FxRateSource {
    /// Fetch the daily series of one currency pair
    fn fetch_fx_daily(&self, pair: CurrencyPair) -> Result<FetchResponse>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Interest-rate benchmark publisher
pub trait BenchmarkSource {
    /// Fetch the raw CSV publication of a benchmark for one year
    fn fetch_csv(&self, benchmark: Benchmark, year: i32) -> Result<FetchResponse>;

    /// Get the source name
    fn name(&self) -> &str;
}
