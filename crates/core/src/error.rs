//! Error types for the turnover pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the turnover pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bound column is missing from the table header.
    #[error("Missing column '{column}' in header for source '{source_name}'")]
    MissingColumn { source_name: String, column: String },

    /// A raw row does not have as many fields as the header.
    #[error("Malformed row {row}: expected {expected} fields, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A date cell did not match the configured format.
    #[error("Unparseable date '{text}' in row {row} (format '{format}')")]
    UnparseableDate {
        row: usize,
        text: String,
        format: String,
    },

    /// The row extractor failed to produce a table.
    #[error("Extraction error: {0}")]
    Extract(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an extraction error.
    pub fn extract(msg: impl Into<String>) -> Self {
        Error::Extract(msg.into())
    }

    /// Whether the error concerns a single row and the batch may continue.
    pub fn is_row_level(&self) -> bool {
        matches!(self, Error::MalformedRow { .. } | Error::UnparseableDate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_classification() {
        let malformed = Error::MalformedRow { row: 3, expected: 7, found: 5 };
        assert!(malformed.is_row_level());
        assert_eq!(malformed.to_string(), "Malformed row 3: expected 7 fields, found 5");

        assert!(!Error::config("bad").is_row_level());
    }
}
