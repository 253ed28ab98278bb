//! Gather → merge → query orchestration
//!
//! Requests are processed one at a time. A request that fails in a way that
//! only concerns itself (bad status, unexpected layout, unreadable payload) is
//! logged and skipped; an exhausted API quota aborts the run before anything
//! is merged.

use crate::config::{PipelineConfig, RateRequest};
use crate::data::aggregate::aggregate;
use crate::data::benchmarks::normalize_rate_table;
use crate::data::clean::{clean_with_report, CleanReport};
use crate::data::fx::normalize_fx;
use crate::data::sources::{parse_fx_daily, BenchmarkSource, FetchResponse, FxRateSource};
use crate::error::{RatesError, Result};
use crate::query::{run_query, QueryResult, SnapshotWriter};
use crate::store::RateStore;
use crate::types::{ObservationBatch, RateKind};

/// A request that produced no data
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

/// Outcome of gathering every configured request
#[derive(Debug, Clone, Default)]
pub struct GatherReport {
    /// All gathered rows, sorted by (Date, Rate)
    pub batch: ObservationBatch,
    /// Rows gathered per request
    pub fetched: Vec<(String, usize)>,
    pub skipped: Vec<SkippedItem>,
    /// Rows dropped for non-numeric values
    pub dropped_rows: usize,
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub gathered: GatherReport,
    pub store_rows: usize,
    pub result: QueryResult,
}

/// The rates pipeline, wired to its two raw-data sources
pub struct RatesPipeline {
    config: PipelineConfig,
    fx_source: Box<dyn FxRateSource>,
    benchmark_source: Box<dyn BenchmarkSource>,
}

impl RatesPipeline {
    /// Create a pipeline. The configuration is validated up front.
    pub fn new<F, B>(config: PipelineConfig, fx_source: F, benchmark_source: B) -> Result<Self>
    where
        F: FxRateSource + 'static,
        B: BenchmarkSource + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            fx_source: Box::new(fx_source),
            benchmark_source: Box::new(benchmark_source),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> RateStore {
        RateStore::new(&self.config.store_path)
    }

    /// Fetch, normalize and clean a single request
    pub fn fetch_one(&self, request: RateRequest) -> Result<(ObservationBatch, CleanReport)> {
        match request {
            RateRequest::Fx(pair) => {
                let response = self.fx_source.fetch_fx_daily(pair)?;
                ensure_success(&response, self.fx_source.name(), &request)?;
                let series = parse_fx_daily(&response.body)?;
                let raw = normalize_fx(&series, pair.quote);
                Ok(clean_with_report(raw, RateKind::Fx))
            }
            RateRequest::Benchmark { benchmark, year } => {
                let response = self.benchmark_source.fetch_csv(benchmark, year)?;
                ensure_success(&response, self.benchmark_source.name(), &request)?;
                let raw = normalize_rate_table(&response.body, benchmark)?;
                Ok(clean_with_report(raw, benchmark.kind()))
            }
        }
    }

    /// Gather every configured request
    pub fn gather(&self) -> Result<GatherReport> {
        self.gather_with(|_, _, _| {})
    }

    /// Gather every configured request, calling `on_item(index, total, label)`
    /// before each one.
    pub fn gather_with<P>(&self, mut on_item: P) -> Result<GatherReport>
    where
        P: FnMut(usize, usize, &str),
    {
        log::info!("Gathering data...");
        let requests = self.config.requests()?;
        let mut report = GatherReport::default();
        let mut batches = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let label = request.to_string();
            on_item(index, requests.len(), &label);
            log::info!("Gathering {}", label);

            match self.fetch_one(*request) {
                Ok((batch, clean_report)) => {
                    report.fetched.push((label, batch.len()));
                    report.dropped_rows += clean_report.rejected.len();
                    batches.push(batch);
                }
                Err(RatesError::QuotaExhausted(reason)) => {
                    log::error!(
                        "Alpha Vantage free account only supports 5 calls per minute and 500 calls per day"
                    );
                    return Err(RatesError::QuotaExhausted(reason));
                }
                Err(e) if e.is_recoverable() => {
                    match &e {
                        RatesError::LayoutMismatch { .. } => {
                            log::error!("Skipping {}: {}", label, e)
                        }
                        _ => log::warn!("Error downloading {}: {}", label, e),
                    }
                    report.skipped.push(SkippedItem {
                        item: label,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        report.batch = aggregate(batches);
        log::info!(
            "Data gathered: {} rows from {} sources, {} skipped",
            report.batch.len(),
            report.fetched.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Merge a batch into the configured store
    pub fn update_store(&self, batch: &ObservationBatch) -> Result<ObservationBatch> {
        self.store().merge(batch)
    }

    /// Run the configured query against the store
    pub fn query(&self) -> Result<QueryResult> {
        let query = self.config.query.to_query()?;
        run_query(
            &self.store(),
            &query,
            &SnapshotWriter::new(&self.config.snapshot_dir),
            self.config.snapshot_scope,
        )
    }

    /// Gather, merge and query
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with(|_, _, _| {})
    }

    /// Same as [`RatesPipeline::run`] with a progress callback for the gather step
    pub fn run_with<P>(&self, on_item: P) -> Result<RunSummary>
    where
        P: FnMut(usize, usize, &str),
    {
        let gathered = self.gather_with(on_item)?;
        let merged = self.update_store(&gathered.batch)?;
        let result = self.query()?;
        Ok(RunSummary {
            gathered,
            store_rows: merged.len(),
            result,
        })
    }
}

fn ensure_success(response: &FetchResponse, source_name: &str, request: &RateRequest) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(RatesError::TransportFailure {
        source_name: source_name.to_string(),
        item: request.to_string(),
        status: response.status,
    })
}
