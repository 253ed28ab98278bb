//! Alpha Vantage data source integration
//!
//! Provides daily FX time series (`function=FX_DAILY`). The free tier answers
//! an exhausted call budget with HTTP 200 and a payload that lacks the time
//! series, so a missing series is reported as [`RatesError::QuotaExhausted`].

use crate::data::fx::{FxDailySeries, OhlcQuote};
use crate::error::{RatesError, Result};
use crate::types::ISO_DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";
const TIME_SERIES_KEY: &str = "Time Series FX (Daily)";

/// How much history one request returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Latest 100 data points
    #[default]
    Compact,
    /// Full history
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

#[derive(Debug, Deserialize)]
struct FxDailyResponse {
    #[serde(rename = "Time Series FX (Daily)", default)]
    time_series: Option<HashMap<String, FxDailyBar>>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FxDailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

/// Parse an `FX_DAILY` JSON payload into a date-ordered series
pub fn parse_fx_daily(body: &str) -> Result<FxDailySeries> {
    let data: FxDailyResponse = serde_json::from_str(body)
        .map_err(|e| RatesError::DataError(format!("JSON parse error: {}", e)))?;

    let time_series = data.time_series.ok_or_else(|| {
        let reason = data
            .note
            .or(data.information)
            .or(data.error_message)
            .unwrap_or_else(|| format!("response has no '{}' key", TIME_SERIES_KEY));
        RatesError::QuotaExhausted(reason)
    })?;

    time_series
        .into_iter()
        .map(|(date_str, bar)| {
            let date = NaiveDate::parse_from_str(&date_str, ISO_DATE_FORMAT)
                .map_err(|e| RatesError::ParseError(format!("Date parse error: {}", e)))?;
            Ok((date, OhlcQuote::new(bar.open, bar.high, bar.low, bar.close)))
        })
        .collect()
}

#[cfg(feature = "http")]
pub use client::AlphaVantageClient;

#[cfg(feature = "http")]
mod client {
    use super::{OutputSize, ALPHA_VANTAGE_BASE_URL};
    use crate::data::fx::CurrencyPair;
    use crate::data::sources::{FetchResponse, FxRateSource};
    use crate::error::{RatesError, Result};
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// Alpha Vantage data source
    pub struct AlphaVantageClient {
        api_key: String,
        base_url: String,
        output_size: OutputSize,
        client: Client,
    }

    impl AlphaVantageClient {
        /// Create a new Alpha Vantage client
        pub fn new(api_key: String) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| {
                    RatesError::DataError(format!("Failed to create HTTP client: {}", e))
                })?;

            Ok(Self {
                api_key,
                base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
                output_size: OutputSize::default(),
                client,
            })
        }

        pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
            self.base_url = base_url.into();
            self
        }

        pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
            self.output_size = output_size;
            self
        }
    }

    impl FxRateSource for AlphaVantageClient {
        fn fetch_fx_daily(&self, pair: CurrencyPair) -> Result<FetchResponse> {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("function", "FX_DAILY"),
                    ("from_symbol", pair.base.as_str()),
                    ("to_symbol", pair.quote.as_str()),
                    ("outputsize", self.output_size.as_str()),
                    ("datatype", "json"),
                    ("apikey", self.api_key.as_str()),
                ])
                .send()
                .map_err(|e| {
                    log::warn!("HTTP request for {} failed: {}", pair, e);
                    RatesError::TransportFailure {
                        source_name: self.name().to_string(),
                        item: pair.to_string(),
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
            "Alpha Vantage"
        }
    }
}
