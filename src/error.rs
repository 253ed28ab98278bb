//! Error types for rusty_rates

use thiserror::Error;

/// Main error type for the rates pipeline
#[derive(Error, Debug)]
pub enum RatesError {
    /// Non-success response from an external source. Recovered by skipping the item.
    #[error("Transport failure from {source_name} ({item}): status {status}")]
    TransportFailure {
        source_name: String,
        item: String,
        status: u16,
    },

    /// The rate API stopped returning time series data. Aborts the whole run.
    #[error("API call quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error(
        "Schema mismatch: store has {store_columns} columns, incoming batch has {incoming_columns} columns"
    )]
    SchemaMismatch {
        store_columns: usize,
        incoming_columns: usize,
    },

    #[error("Malformed value '{value}' for {rate} on {date}")]
    MalformedValue {
        rate: String,
        date: String,
        value: String,
    },

    /// A benchmark CSV no longer matches its parsing rules.
    #[error("Layout mismatch in {source_name}: {detail}")]
    LayoutMismatch { source_name: String, detail: String },

    #[error("Invalid date '{0}', expected dd/mm/yyyy")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl RatesError {
    /// Whether the pipeline may skip the failing item and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RatesError::TransportFailure { .. }
                | RatesError::MalformedValue { .. }
                | RatesError::LayoutMismatch { .. }
                | RatesError::DataError(_)
                | RatesError::ParseError(_)
        )
    }
}

/// Result type alias for rates pipeline operations
pub type Result<T> = std::result::Result<T, RatesError>;
