//! rusty-rates CLI - gather, store and query market rates
//!
//! ## Example Usage
//!
//! ```bash
//! # Gather every configured rate, update the store, run the configured query
//! ALPHA_VANTAGE_API_KEY=... rusty-rates run
//!
//! # Same, replaying saved payloads instead of calling the providers
//! rusty-rates run --offline ./payloads
//!
//! # Query the store
//! rusty-rates query --rates USD,EURIBOR --from 01/01/2020 --to 15/05/2020
//!
//! # Merge an older snapshot back into the store
//! rusty-rates import data/Rates_to_upload_1589500000.csv
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rusty_rates::config::PipelineConfig;
use rusty_rates::data::sources::{AlphaVantageClient, DirectorySource, EmmiClient};
use rusty_rates::pipeline::{GatherReport, RatesPipeline};
use rusty_rates::query::{run_query, QueryResult, RateQuery, SnapshotScope, SnapshotWriter};
use rusty_rates::store::RateStore;
use rusty_rates::types::format_dmy;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// rusty-rates: FX fixing and EURIBOR/EONIA rate pipeline
#[derive(Parser)]
#[command(name = "rusty-rates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "FX fixing and EURIBOR/EONIA rate pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct SourceArgs {
    /// Alpha Vantage API key
    #[arg(long, env = "ALPHA_VANTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Replay saved payloads from a directory instead of fetching
    #[arg(long, value_name = "DIR")]
    offline: Option<PathBuf>,

    /// Years of benchmark publications to fetch (overrides config)
    #[arg(short = 'y', long, value_delimiter = ',')]
    years: Option<Vec<i32>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Gather, update the store, then run the configured query
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format of the query result
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Gather every configured rate and merge it into the store
    Gather {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Filter the store by rate and date range
    Query {
        /// Rates to return, comma separated (EURIBOR expands to its tenors)
        #[arg(short = 'r', long, value_delimiter = ',')]
        rates: Option<Vec<String>>,

        /// First date, dd/mm/yyyy
        #[arg(long)]
        from: Option<String>,

        /// Last date, dd/mm/yyyy (defaults to --from when --from is given)
        #[arg(long)]
        to: Option<String>,

        /// What to dump into the snapshot file
        #[arg(short = 's', long, value_enum)]
        scope: Option<ScopeArg>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Merge a Date,Value,Rate CSV into the store
    Import {
        /// CSV file to merge
        #[arg(value_name = "CSV")]
        file: PathBuf,
    },

    /// Write a default configuration file and bootstrap an empty store
    Init {
        /// Overwrite an existing file
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Show configuration and store statistics
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    /// Entire store
    Full,
    /// Query rows only
    Result,
}

impl From<ScopeArg> for SnapshotScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Full => SnapshotScope::FullStore,
            ScopeArg::Result => SnapshotScope::QueryResult,
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-rates")
        .join("config.toml")
}

fn load_config(path: Option<&Path>) -> PipelineConfig {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !config_path.exists() {
        if path.is_some() {
            eprintln!(
                "{} Config file {} not found, using defaults",
                "Warning:".yellow(),
                config_path.display()
            );
        }
        return PipelineConfig::default();
    }

    match fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => return config,
            Err(e) => {
                eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
            }
        },
        Err(e) => {
            eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
        }
    }

    PipelineConfig::default()
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config.as_deref());

    if cli.verbose {
        println!(
            "{} v{}",
            "rusty-rates".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Store: {}",
            config.store_path.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::Run { source, format } => run_all(config, source, format),
        Commands::Gather { source } => gather(config, source),
        Commands::Query {
            rates,
            from,
            to,
            scope,
            format,
        } => run_rate_query(config, rates, from, to, scope, format),
        Commands::Import { file } => import(&config, &file),
        Commands::Init { force } => init(cli.config.as_deref(), &config, force),
        Commands::Info => show_info(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn build_pipeline(mut config: PipelineConfig, source: SourceArgs) -> anyhow::Result<RatesPipeline> {
    if let Some(years) = source.years {
        config.years = years;
    }

    let pipeline = match source.offline {
        Some(dir) => {
            let replay = DirectorySource::new(dir);
            RatesPipeline::new(config, replay.clone(), replay)?
        }
        None => {
            let Some(api_key) = source.api_key else {
                bail!("no Alpha Vantage API key, pass --api-key or set ALPHA_VANTAGE_API_KEY");
            };
            let fx = AlphaVantageClient::new(api_key)?.with_output_size(config.fx_output_size);
            let benchmarks = EmmiClient::new()?;
            RatesPipeline::new(config, fx, benchmarks)?
        }
    };
    Ok(pipeline)
}

fn gather_with_progress(pipeline: &RatesPipeline) -> anyhow::Result<GatherReport> {
    let total = pipeline.config().requests()?.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let report = pipeline.gather_with(|index, _, label| {
        pb.set_position(index as u64);
        pb.set_message(label.to_string());
    });

    match &report {
        Ok(_) => pb.finish_with_message("Complete!"),
        Err(_) => pb.abandon_with_message("Aborted"),
    }
    Ok(report?)
}

fn print_gather_summary(report: &GatherReport) {
    println!("{}", "Gather Summary".green().bold());
    println!("{}", "==============".green());
    for (item, rows) in &report.fetched {
        println!("  {} {}", format!("{}:", item).bold(), rows);
    }
    for skipped in &report.skipped {
        println!(
            "  {} {} {}",
            format!("{}:", skipped.item).bold(),
            "skipped".yellow(),
            skipped.reason.dimmed()
        );
    }
    if report.dropped_rows > 0 {
        println!(
            "  {} {}",
            "Non-numeric rows dropped:".bold(),
            report.dropped_rows.to_string().yellow()
        );
    }
    println!("  {} {}", "Rows gathered:".bold(), report.batch.len());
    println!();
}

fn run_all(config: PipelineConfig, source: SourceArgs, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", "Running rates pipeline...".cyan().bold());
    println!();

    let pipeline = build_pipeline(config, source)?;
    let report = gather_with_progress(&pipeline)?;
    print_gather_summary(&report);

    let merged = pipeline.update_store(&report.batch)?;
    println!(
        "{} Store updated: {} ({} rows)",
        "✓".green().bold(),
        pipeline.store().path().display(),
        merged.len()
    );
    println!();

    let result = pipeline.query()?;
    print_result(&result, format)
}

fn gather(config: PipelineConfig, source: SourceArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, source)?;
    let report = gather_with_progress(&pipeline)?;
    print_gather_summary(&report);

    let merged = pipeline.update_store(&report.batch)?;
    println!(
        "{} Store updated: {} ({} rows)",
        "✓".green().bold(),
        pipeline.store().path().display(),
        merged.len()
    );
    Ok(())
}

fn run_rate_query(
    config: PipelineConfig,
    rates: Option<Vec<String>>,
    from: Option<String>,
    to: Option<String>,
    scope: Option<ScopeArg>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rates = rates.unwrap_or_else(|| config.query.rates.clone());
    let query = match from {
        Some(from) => RateQuery::parse(&rates, &from, to.as_deref())?,
        None => RateQuery::parse(
            &rates,
            &config.query.from,
            to.as_deref().or(config.query.last_date()),
        )?,
    };
    let scope = scope.map(SnapshotScope::from).unwrap_or(config.snapshot_scope);

    let result = run_query(
        &RateStore::new(&config.store_path),
        &query,
        &SnapshotWriter::new(&config.snapshot_dir),
        scope,
    )?;
    print_result(&result, format)
}

fn print_result(result: &QueryResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.to_rows())?);
        }
        OutputFormat::Table => {
            println!("{}", "Query Result".green().bold());
            println!("{}", "============".green());
            println!("  {:<12} {:>12}  {}", "Date".bold(), "Value".bold(), "Rate".bold());
            for row in result.to_rows() {
                let value = row
                    .value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<12} {:>12}  {}", row.date, value, row.rate.bright_green());
            }
            println!();
            println!("  {} {}", "Rows:".bold(), result.len());
            println!(
                "  {} {}",
                "Snapshot:".bold(),
                result.snapshot.display().to_string().dimmed()
            );
        }
    }
    Ok(())
}

fn import(config: &PipelineConfig, file: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        bail!("CSV file not found: {}", file.display());
    }
    let store = RateStore::new(&config.store_path);
    let merged = store
        .import_file(file)
        .with_context(|| format!("importing {}", file.display()))?;
    println!(
        "{} Imported into {} ({} rows)",
        "✓".green().bold(),
        store.path().display(),
        merged.len()
    );
    Ok(())
}

fn init(path: Option<&Path>, config: &PipelineConfig, force: bool) -> anyhow::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if path.exists() && !force {
        println!(
            "{} {} already exists. Use {} to overwrite.",
            "Warning:".yellow(),
            path.display(),
            "--force".bright_yellow()
        );
    } else {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(config)?;
        fs::write(&path, contents)?;
        println!(
            "{} Configuration written to: {}",
            "✓".green().bold(),
            path.display()
        );
    }

    let store = RateStore::new(&config.store_path);
    if store.ensure_exists()? {
        println!("{} Store created at: {}", "✓".green().bold(), store.path().display());
    } else {
        println!("  Store already present at: {}", store.path().display().to_string().dimmed());
    }
    Ok(())
}

fn show_info(config: &PipelineConfig) -> anyhow::Result<()> {
    println!("{} {}", "rusty-rates".cyan().bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    println!("  {} {}", "Rates:".bold(), config.rates.join(", "));
    println!(
        "  {} {}",
        "Years:".bold(),
        config
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  {} {}", "Base currency:".bold(), config.base_currency);
    println!("  {} {}", "Store:".bold(), config.store_path.display());
    println!("  {} {}", "Snapshots:".bold(), config.snapshot_dir.display());
    println!("  {} {:?}", "Snapshot scope:".bold(), config.snapshot_scope);
    println!();

    println!("{}", "Store".bold());
    println!("{}", "=====".dimmed());
    let store = RateStore::new(&config.store_path);
    if !store.exists() {
        println!("  {} {}", "Status:".bold(), "Not created".red());
        println!();
        println!("{}", "  Run 'rusty-rates run' to gather data.".dimmed());
        println!();
        return Ok(());
    }

    let stats = store.stats()?;
    println!("  {} {}", "Status:".bold(), "Available".green());
    println!("  {} {}", "Rows:".bold(), stats.rows);
    println!("  {} {}", "Rates:".bold(), stats.rates.join(", "));
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        println!(
            "  {} {} to {}",
            "Date range:".bold(),
            format_dmy(first),
            format_dmy(last)
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = vec!["rusty-rates", "info"];
        let _cli = Cli::try_parse_from(args).unwrap();
    }

    #[test]
    fn test_run_offline() {
        let args = vec!["rusty-rates", "run", "--offline", "payloads", "--years", "2020,2019"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run { source, format } => {
                assert_eq!(source.offline, Some(PathBuf::from("payloads")));
                assert_eq!(source.years, Some(vec![2020, 2019]));
                assert_eq!(format, OutputFormat::Table);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_query_command() {
        let args = vec![
            "rusty-rates",
            "query",
            "--rates",
            "USD,EURIBOR",
            "--from",
            "01/01/2020",
            "--scope",
            "result",
            "--format",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Query {
                rates,
                from,
                to,
                scope,
                format,
            } => {
                assert_eq!(rates, Some(vec!["USD".to_string(), "EURIBOR".to_string()]));
                assert_eq!(from.as_deref(), Some("01/01/2020"));
                assert!(to.is_none());
                assert_eq!(scope.map(SnapshotScope::from), Some(SnapshotScope::QueryResult));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(vec!["rusty-rates", "import"]).is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let contents = toml::to_string_pretty(&PipelineConfig::default()).unwrap();
        let config: PipelineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
