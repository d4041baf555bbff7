//! Error types for the replayer.

use std::path::PathBuf;

use geotrace_core::RecordError;
use thiserror::Error;

/// Result type alias for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that abort (or, for sends, may be tolerated by) a replay run.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to open record source {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("record source is missing column `{0}`")]
    MissingColumn(&'static str),

    #[error("failed to read source row {row}: {source}")]
    Read { row: u64, source: csv::Error },

    #[error("record {index} has an unusable timestamp: {source}")]
    Timestamp { index: usize, source: RecordError },

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("collector responded with status {0}")]
    Status(http::StatusCode),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("collector at {address} not ready after {attempts} attempts")]
    NotReady { address: String, attempts: u32 },
}
