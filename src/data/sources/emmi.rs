//! EMMI benchmark publications (EURIBOR, EONIA yearly CSV files)

use crate::data::benchmarks::Benchmark;
use crate::data::sources::{BenchmarkSource, FetchResponse};
use crate::error::{RatesError, Result};
use reqwest::blocking::Client;
use std::time::Duration;

pub const EMMI_BASE_URL: &str = "https://www.emmi-benchmarks.eu/assets/components/rateisblue/file_processing/publication/processed";

/// EMMI publication site (no API key required)
pub struct EmmiClient {
    base_url: String,
    client: Client,
}

impl EmmiClient {
    /// Create a new EMMI client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| RatesError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: EMMI_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Publication URL of a benchmark for one year
    pub fn url(&self, benchmark: Benchmark, year: i32) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            benchmark.file_name(year)
        )
    }
}

impl BenchmarkSource for EmmiClient {
    fn fetch_csv(&self, benchmark: Benchmark, year: i32) -> Result<FetchResponse> {
        let url = self.url(benchmark, year);
        let response = self.client.get(&url).send().map_err(|e| {
            log::warn!("HTTP request to {} failed: {}", url, e);
            RatesError::TransportFailure {
                source_name: self.name().to_string(),
                item: format!("{} {}", benchmark, year),
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| RatesError::DataError(format!("Failed to read response: {}", e)))?;
        Ok(FetchResponse::new(status, body))
    }

    fn name(&self) -> &str {
        "EMMI"
    }
}
