//! End-to-end pipeline runs against replayed payloads
//!
//! Payloads are written into a temporary directory and served by
//! `DirectorySource`, so the tests never touch the network.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use rusty_rates::config::{PipelineConfig, QueryConfig};
use rusty_rates::data::benchmarks::Benchmark;
use rusty_rates::data::fx::{Currency, CurrencyPair};
use rusty_rates::data::sources::{BenchmarkSource, DirectorySource, FetchResponse, FxRateSource};
use rusty_rates::error::{RatesError, Result};
use rusty_rates::pipeline::RatesPipeline;
use rusty_rates::query::SnapshotScope;
use rusty_rates::store::RateStore;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::{tempdir, TempDir};

const USD_JSON: &str = r#"{
    "Meta Data": {"1. Information": "Forex Daily Prices (open, high, low, close)"},
    "Time Series FX (Daily)": {
        "2020-01-03": {"1. open": "1.1170", "2. high": "1.1180", "3. low": "1.1130", "4. close": "1.1160"},
        "2020-01-02": {"1. open": "1.1215", "2. high": "1.1225", "3. low": "1.1170", "4. close": "1.1172"},
        "2020-01-01": {"1. open": "1.1210", "2. high": "1.1230", "3. low": "1.1200", "4. close": "1.1215"}
    }
}"#;

const GBP_JSON: &str = r#"{
    "Time Series FX (Daily)": {
        "2020-01-02": {"1. open": "0.8480", "2. high": "0.8520", "3. low": "0.8470", "4. close": "0.8508"},
        "2020-01-01": {"1. open": "0.8470", "2. high": "0.8490", "3. low": "0.8460", "4. close": "N/A"}
    }
}"#;

const EURIBOR_2020: &str = ",02/01/2020,03/01/2020,\n\
                            1w,-0.452,-0.453,\n\
                            1m,-0.441,,\n\
                            3m,-0.384,-0.386,\n\
                            6m,-0.325,-0.327,\n\
                            9m,-0.291,-0.294,\n\
                            12m,-0.249,-0.253,\n";

const EONIA_2020: &str = ",02/01/2020,03/01/2020,\n\
                          ON,-0.449,-0.455,\n\
                          Volume ON (in mln euro),3321,2764,\n";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn payload_dir() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("fx_daily_EUR_USD.json"), USD_JSON).unwrap();
    fs::write(dir.path().join("fx_daily_EUR_GBP.json"), GBP_JSON).unwrap();
    fs::write(dir.path().join("hist_EURIBOR_2020.csv"), EURIBOR_2020).unwrap();
    fs::write(dir.path().join("hist_EONIA_2020.csv"), EONIA_2020).unwrap();
    dir
}

fn config(work: &Path, rates: &[&str], years: &[i32]) -> PipelineConfig {
    PipelineConfig {
        rates: rates.iter().map(|r| r.to_string()).collect(),
        years: years.to_vec(),
        store_path: work.join("data").join("Historical_Rates.csv"),
        snapshot_dir: work.join("data"),
        query: QueryConfig {
            rates: vec!["USD".into(), "GBP".into(), "EURIBOR".into(), "EONIA".into()],
            from: "01/01/2020".into(),
            to: Some("02/01/2020".into()),
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn test_offline_run_end_to_end() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let pipeline = RatesPipeline::new(
        config(work.path(), &["EURIBOR", "USD", "GBP", "EONIA"], &[2020]),
        source.clone(),
        source,
    )
    .unwrap();

    let summary = pipeline.run().unwrap();

    // 3 USD + 1 GBP (one N/A close dropped) + 6 tenors x 2 dates + 2 EONIA
    assert_eq!(summary.gathered.batch.len(), 3 + 1 + 12 + 2);
    assert_eq!(summary.gathered.dropped_rows, 1);
    assert!(summary.gathered.skipped.is_empty());
    assert_eq!(summary.store_rows, 18);

    let rows = summary.result.to_rows();
    // 01/01: USD. 02/01: USD, GBP, 6 tenors, EONIA
    assert_eq!(rows.len(), 1 + 1 + 1 + 6 + 1);
    assert_eq!(rows[0].date, "01/01/2020");
    assert_eq!(rows[0].rate, "USD");
    assert_relative_eq!(rows[0].value.unwrap(), 1.1215);

    let second_day: Vec<&str> = rows[1..].iter().map(|r| r.rate.as_str()).collect();
    assert_eq!(
        second_day,
        vec!["EONIA", "EUR12M", "EUR1M", "EUR1W", "EUR3M", "EUR6M", "EUR9M", "GBP", "USD"]
    );
    assert!(summary.result.snapshot.exists());
}

#[test]
fn test_gaps_are_stored_not_zero_filled() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let pipeline =
        RatesPipeline::new(config(work.path(), &["EURIBOR"], &[2020]), source.clone(), source).unwrap();

    let report = pipeline.gather().unwrap();
    pipeline.update_store(&report.batch).unwrap();

    let stored = pipeline.store().load().unwrap();
    let gap = stored
        .iter()
        .find(|o| o.date == d(2020, 1, 3) && o.rate == "EUR1M")
        .unwrap();
    assert_eq!(gap.value, None);
}

#[test]
fn test_missing_year_is_skipped() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let pipeline = RatesPipeline::new(
        config(work.path(), &["EONIA", "USD"], &[2020, 2019]),
        source.clone(),
        source,
    )
    .unwrap();

    let report = pipeline.gather().unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].item, "EONIA, year 2019");
    assert!(report.skipped[0].reason.contains("404"));
    assert_eq!(report.batch.len(), 2 + 3);
}

#[test]
fn test_changed_publication_layout_is_skipped() {
    let payloads = payload_dir();
    fs::write(
        payloads.path().join("hist_EONIA_2020.csv"),
        ",02/01/2020,\nON,-0.449,\n",
    )
    .unwrap();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let pipeline =
        RatesPipeline::new(config(work.path(), &["EONIA", "USD"], &[2020]), source.clone(), source)
            .unwrap();

    let report = pipeline.gather().unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("Layout mismatch"));
    assert!(report.batch.iter().all(|o| o.rate == "USD"));
}

/// FX source answering with an exhausted quota after a number of calls
struct QuotaLimited {
    inner: DirectorySource,
    remaining: RefCell<usize>,
    calls: Rc<RefCell<Vec<CurrencyPair>>>,
}

impl FxRateSource for QuotaLimited {
    fn fetch_fx_daily(&self, pair: CurrencyPair) -> Result<FetchResponse> {
        self.calls.borrow_mut().push(pair);
        let mut remaining = self.remaining.borrow_mut();
        if *remaining == 0 {
            return Ok(FetchResponse::ok(
                r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute and 500 calls per day."}"#,
            ));
        }
        *remaining -= 1;
        self.inner.fetch_fx_daily(pair)
    }

    fn name(&self) -> &str {
        "quota-limited"
    }
}

#[test]
fn test_quota_exhaustion_aborts_without_saving() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let fx = QuotaLimited {
        inner: DirectorySource::new(payloads.path()),
        remaining: RefCell::new(1),
        calls: Rc::clone(&calls),
    };
    let pipeline = RatesPipeline::new(
        config(work.path(), &["USD", "GBP", "NOK", "EURIBOR"], &[2020]),
        fx,
        DirectorySource::new(payloads.path()),
    )
    .unwrap();

    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, RatesError::QuotaExhausted(ref note) if note.contains("5 calls per minute")));
    assert_eq!(
        *calls.borrow(),
        vec![
            CurrencyPair::new(Currency::EUR, Currency::USD),
            CurrencyPair::new(Currency::EUR, Currency::GBP),
        ]
    );
    assert!(!RateStore::new(work.path().join("data").join("Historical_Rates.csv")).exists());
}

/// Benchmark source that fails every request
struct Unavailable;

impl BenchmarkSource for Unavailable {
    fn fetch_csv(&self, _benchmark: Benchmark, _year: i32) -> Result<FetchResponse> {
        Ok(FetchResponse::new(503, "Service Unavailable"))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[test]
fn test_second_run_keeps_first_values() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let cfg = config(work.path(), &["USD"], &[2020]);

    RatesPipeline::new(cfg.clone(), source.clone(), Unavailable)
        .unwrap()
        .run()
        .unwrap();

    // republished series with a revised fixing
    fs::write(
        payloads.path().join("fx_daily_EUR_USD.json"),
        USD_JSON.replace("\"4. close\": \"1.1215\"", "\"4. close\": \"1.2000\""),
    )
    .unwrap();
    let summary = RatesPipeline::new(cfg, source, Unavailable)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.store_rows, 3);
    assert_relative_eq!(summary.result.to_rows()[0].value.unwrap(), 1.1215);
}

#[test]
fn test_result_scoped_snapshot_config() {
    let payloads = payload_dir();
    let work = tempdir().unwrap();
    let source = DirectorySource::new(payloads.path());
    let cfg = PipelineConfig {
        snapshot_scope: SnapshotScope::QueryResult,
        query: QueryConfig {
            rates: vec!["USD".into()],
            from: "03/01/2020".into(),
            to: None,
        },
        ..config(work.path(), &["USD"], &[2020])
    };

    let summary = RatesPipeline::new(cfg, source, Unavailable)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.result.len(), 1);
    let snapshot = fs::read_to_string(&summary.result.snapshot).unwrap();
    assert_eq!(snapshot, "Date,Value,Rate\n03/01/2020,1.116,USD\n");
}
