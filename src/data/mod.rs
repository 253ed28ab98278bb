//! Raw rate data: sources, normalization, cleaning and aggregation
//!
//! Every source is reduced to the canonical `{Date, Value, Rate}` shape:
//!
//! ```text
//! FX JSON ──► fx::normalize_fx ────────────┐
//!                                          ├─► clean::clean ─► aggregate::aggregate
//! CSV ──► benchmarks::normalize_rate_table ┘
//! ```

pub mod aggregate;
pub mod benchmarks;
pub mod clean;
pub mod fx;
pub mod sources;

pub use aggregate::aggregate;
pub use benchmarks::{normalize_rate_table, Benchmark, RateTableLayout, TrailingRow};
pub use clean::{clean, clean_with_report, CleanReport};
pub use fx::{normalize_fx, Currency, CurrencyPair, FxDailySeries, OhlcQuote};
