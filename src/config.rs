//! Pipeline configuration
//!
//! Everything the pipeline needs is passed in through [`PipelineConfig`];
//! there is no process-wide state. Defaults reproduce the classic setup:
//! EURIBOR, EONIA and five EUR crosses for 2019–2020, queried for the first
//! months of 2020.

use crate::data::benchmarks::Benchmark;
use crate::data::fx::{Currency, CurrencyPair};
use crate::data::sources::OutputSize;
use crate::error::{RatesError, Result};
use crate::query::{RateQuery, SnapshotScope};
use crate::types::{parse_dmy, RateKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Query part of the configuration, dates as `dd/mm/yyyy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_rates")]
    pub rates: Vec<String>,
    #[serde(default = "default_from")]
    pub from: String,
    /// Last date. `to = ""` queries the single day `from`.
    #[serde(default = "default_to")]
    pub to: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            rates: default_query_rates(),
            from: default_from(),
            to: default_to(),
        }
    }
}

impl QueryConfig {
    /// Configured last date, `None` when absent or blank
    pub fn last_date(&self) -> Option<&str> {
        self.to.as_deref().map(str::trim).filter(|to| !to.is_empty())
    }

    pub fn to_query(&self) -> Result<RateQuery> {
        RateQuery::parse(&self.rates, &self.from, self.last_date())
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Requested identifiers: FX quote currencies, `EURIBOR`, `EONIA`
    #[serde(default = "default_rates")]
    pub rates: Vec<String>,
    /// Publication years for interest-rate benchmarks
    #[serde(default = "default_years")]
    pub years: Vec<i32>,
    /// Base currency of every FX pair
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default)]
    pub fx_output_size: OutputSize,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default)]
    pub snapshot_scope: SnapshotScope,
    #[serde(default)]
    pub query: QueryConfig,
}

fn default_rates() -> Vec<String> {
    ["EURIBOR", "USD", "NOK", "GBP", "JPY", "CHF", "EONIA"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_years() -> Vec<i32> {
    vec![2020, 2019]
}

fn default_base_currency() -> String {
    "EUR".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data").join("Historical_Rates.csv")
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_query_rates() -> Vec<String> {
    ["USD", "GBP", "NOK", "EURIBOR", "EONIA"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_from() -> String {
    "01/01/2020".to_string()
}

fn default_to() -> Option<String> {
    Some("15/05/2020".to_string())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rates: default_rates(),
            years: default_years(),
            base_currency: default_base_currency(),
            fx_output_size: OutputSize::default(),
            store_path: default_store_path(),
            snapshot_dir: default_snapshot_dir(),
            snapshot_scope: SnapshotScope::default(),
            query: QueryConfig::default(),
        }
    }
}

/// One unit of work for the gatherer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRequest {
    Fx(CurrencyPair),
    Benchmark { benchmark: Benchmark, year: i32 },
}

impl fmt::Display for RateRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RateRequest::Fx(pair) => write!(f, "{}", pair),
            RateRequest::Benchmark { benchmark, year } => write!(f, "{}, year {}", benchmark, year),
        }
    }
}

impl PipelineConfig {
    /// Check every identifier, currency and date before any fetch happens
    pub fn validate(&self) -> Result<()> {
        if self.rates.is_empty() {
            return Err(RatesError::ConfigError("no rates requested".to_string()));
        }
        self.requests()?;
        if self
            .rates
            .iter()
            .any(|r| RateKind::classify(r).is_benchmark())
            && self.years.is_empty()
        {
            return Err(RatesError::ConfigError(
                "interest-rate benchmarks requested without any year".to_string(),
            ));
        }
        parse_dmy(&self.query.from)?;
        if let Some(to) = self.query.last_date() {
            parse_dmy(to)?;
        }
        Ok(())
    }

    /// Expand requested identifiers into fetch requests, in request order.
    /// Benchmarks yield one request per year.
    pub fn requests(&self) -> Result<Vec<RateRequest>> {
        let base: Currency = self.base_currency.parse()?;
        let mut requests = Vec::new();
        for rate in &self.rates {
            match RateKind::classify(rate) {
                RateKind::Fx => {
                    let quote: Currency = rate.parse()?;
                    requests.push(RateRequest::Fx(CurrencyPair::new(base, quote)));
                }
                kind => {
                    if let Some(benchmark) = Benchmark::from_kind(kind) {
                        for year in &self.years {
                            requests.push(RateRequest::Benchmark {
                                benchmark,
                                year: *year,
                            });
                        }
                    }
                }
            }
        }
        Ok(requests)
    }
}
