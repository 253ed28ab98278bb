//! Base FX types - Currency and CurrencyPair

use crate::error::{RatesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies quoted against the euro in the daily fixings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    EUR,
    USD,
    GBP,
    JPY,
    CHF,
    NOK,
    SEK,
    DKK,
    PLN,
    CZK,
    HUF,
}

impl Currency {
    /// Every supported code, in declaration order
    pub const ALL: [Currency; 11] = [
        Currency::EUR,
        Currency::USD,
        Currency::GBP,
        Currency::JPY,
        Currency::CHF,
        Currency::NOK,
        Currency::SEK,
        Currency::DKK,
        Currency::PLN,
        Currency::CZK,
        Currency::HUF,
    ];

    /// ISO 4217 code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::NOK => "NOK",
            Currency::SEK => "SEK",
            Currency::DKK => "DKK",
            Currency::PLN => "PLN",
            Currency::CZK => "CZK",
            Currency::HUF => "HUF",
        }
    }
}

impl FromStr for Currency {
    type Err = RatesError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == code)
            .ok_or_else(|| {
                RatesError::ConfigError(format!(
                    "Unsupported quote currency '{}' (known: {})",
                    s.trim(),
                    Currency::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Currency pair requested from the rate API, e.g. EUR/NOK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub base: Currency,
    pub quote: Currency,
}

impl CurrencyPair {
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Parse from "EUR/USD" or "EURUSD"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((base, quote)) = s.split_once('/') {
            Ok(Self::new(base.parse()?, quote.parse()?))
        } else if s.len() == 6 && s.is_ascii() {
            Ok(Self::new(s[0..3].parse()?, s[3..6].parse()?))
        } else {
            Err(RatesError::ConfigError(format!(
                "Invalid currency pair format: {}",
                s
            )))
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
