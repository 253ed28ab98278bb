//! # rusty-rates
//!
//! A market-rates ingestion pipeline. Daily FX fixings and yearly EURIBOR/EONIA
//! publications are normalized into a single long-format `{Date, Value, Rate}`
//! table, merged into a persistent CSV store, and queried by date range and
//! rate identifier.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rusty_rates::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = PipelineConfig::default();
//!     let source = DirectorySource::new("payloads");
//!     let pipeline = RatesPipeline::new(config, source.clone(), source)?;
//!
//!     let summary = pipeline.run()?;
//!     for row in summary.result.to_rows() {
//!         println!("{} {:?} {}", row.date, row.value, row.rate);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::{PipelineConfig, QueryConfig, RateRequest};
    pub use crate::data::sources::{BenchmarkSource, DirectorySource, FetchResponse, FxRateSource};
    #[cfg(feature = "http")]
    pub use crate::data::sources::{AlphaVantageClient, EmmiClient};
    pub use crate::data::{Benchmark, Currency, CurrencyPair};
    pub use crate::error::{RatesError, Result};
    pub use crate::pipeline::{GatherReport, RatesPipeline, RunSummary};
    pub use crate::query::{query, RateQuery, SnapshotScope, SnapshotWriter};
    pub use crate::store::{merge, RateStore};
    pub use crate::types::*;
}
