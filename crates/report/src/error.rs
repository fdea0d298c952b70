//! Error types for report output.

use thiserror::Error;

/// Result type alias using our ReportError type.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while rendering or persisting reports.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Pipeline error.
    #[error(transparent)]
    Core(#[from] turnover_core::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Table shape error.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}
