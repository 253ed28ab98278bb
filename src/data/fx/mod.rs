//! Foreign Exchange (FX) fixings
//!
//! # Components
//!
//! - **base**: Currency codes and currency pairs
//! - **series**: Raw daily OHLC series and its normalization into canonical rows
//!
//! # Example
//!
//! ```rust
//! use rusty_rates::data::fx::{normalize_fx, Currency, FxDailySeries, OhlcQuote};
//! use chrono::NaiveDate;
//!
//! let mut series = FxDailySeries::new();
//! let day = NaiveDate::from_ymd_opt(2020, 5, 11).unwrap();
//! series.insert(day, OhlcQuote::new("1.0837", "1.0866", "1.0790", "1.0808"));
//!
//! let rows = normalize_fx(&series, Currency::USD);
//! assert_eq!(rows[0].value, "1.0808");
//! assert_eq!(rows[0].rate, "USD");
//! ```

pub mod base;
pub mod series;

pub use base::{Currency, CurrencyPair};
pub use series::{normalize_fx, FxDailySeries, OhlcQuote};
