//! Directory-backed source replaying previously saved payloads
//!
//! File layout:
//! - `fx_daily_<BASE>_<QUOTE>.json` for FX series
//! - `hist_<BENCHMARK>_<YEAR>.csv` for benchmark publications
//!
//! A missing file answers with status 404, like the remote sources would.

use crate::data::benchmarks::Benchmark;
use crate::data::fx::CurrencyPair;
use crate::data::sources::{BenchmarkSource, FetchResponse, FxRateSource};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name used for a currency pair
    pub fn fx_file_name(pair: CurrencyPair) -> String {
        format!("fx_daily_{}_{}.json", pair.base, pair.quote)
    }

    fn read(&self, file_name: &str) -> Result<FetchResponse> {
        let path = self.dir.join(file_name);
        if !path.is_file() {
            log::debug!("No saved payload at {}", path.display());
            return Ok(FetchResponse::not_found());
        }
        Ok(FetchResponse::ok(fs::read_to_string(&path)?))
    }
}

impl FxRateSource for DirectorySource {
    fn fetch_fx_daily(&self, pair: CurrencyPair) -> Result<FetchResponse> {
        self.read(&Self::fx_file_name(pair))
    }

    fn name(&self) -> &str {
        "directory"
    }
}

impl BenchmarkSource for DirectorySource {
    fn fetch_csv(&self, benchmark: Benchmark, year: i32) -> Result<FetchResponse> {
        self.read(&benchmark.file_name(year))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
