//! Raw tables and the row extractor boundary.
//!
//! Whatever drives the exchange websites hands the pipeline a header plus
//! text rows. Extraction is retried with exponential backoff until it yields
//! a table or the attempts run out.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use turnover_core::{Error, Result};

/// Header and rows as scraped, all text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table from string slices.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Index of a header column, ignoring surrounding whitespace and ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Produces the full table for one source feed.
pub trait RowExtractor {
    /// Fetch the complete table, or fail.
    fn extract(&mut self) -> Result<RawTable>;
}

/// A table already in memory is its own extractor.
impl RowExtractor for RawTable {
    fn extract(&mut self) -> Result<RawTable> {
        Ok(self.clone())
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Delay before the given retry (1 = first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self.multiplier.powi(retry.saturating_sub(1).min(i32::MAX as u32) as i32);
        let ms = (self.initial_backoff_ms as f64 * exp).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms.max(0.0) as u64)
    }
}

/// Only transport-level failures are worth another attempt.
fn is_retryable(err: &Error) -> bool {
    matches!(err, Error::Extract(_) | Error::Io(_))
}

/// Run the extractor until it yields a table, retrying per `policy`.
pub fn fetch_with_retry<E>(extractor: &mut E, policy: &RetryPolicy) -> Result<RawTable>
where
    E: RowExtractor + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match extractor.extract() {
            Ok(table) => {
                info!(attempt, rows = table.len(), "extracted table");
                return Ok(table);
            }
            Err(err) if attempt < attempts && is_retryable(&err) => {
                let delay = policy.backoff(attempt);
                warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "extraction failed, retrying");
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) if is_retryable(&err) => {
                return Err(Error::extract(format!(
                    "gave up after {} attempts: {}",
                    attempt, err
                )));
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyExtractor {
        failures_left: u32,
        calls: u32,
    }

    impl RowExtractor for FlakyExtractor {
        fn extract(&mut self) -> Result<RawTable> {
            self.calls += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(Error::extract("daily table not visible"));
            }
            Ok(RawTable::from_strs(&["Date", "Value"], &[&["01-Oct-2025", "10"]]))
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_column_index_is_lenient() {
        let table = RawTable::from_strs(&[" Date ", "Total Value (Lacs)"], &[]);
        assert_eq!(table.column_index("date"), Some(0));
        assert_eq!(table.column_index("total value (lacs)"), Some(1));
        assert_eq!(table.column_index("Commodity"), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_retry_until_success() {
        let mut extractor = FlakyExtractor { failures_left: 2, calls: 0 };
        let table = fetch_with_retry(&mut extractor, &fast_policy(3)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(extractor.calls, 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let mut extractor = FlakyExtractor { failures_left: 5, calls: 0 };
        let err = fetch_with_retry(&mut extractor, &fast_policy(2)).unwrap_err();
        assert!(matches!(err, Error::Extract(_)));
        assert_eq!(extractor.calls, 2);
    }

    #[test]
    fn test_non_retryable_error_returns_immediately() {
        struct Misconfigured;
        impl RowExtractor for Misconfigured {
            fn extract(&mut self) -> Result<RawTable> {
                Err(Error::config("no url"))
            }
        }
        let err = fetch_with_retry(&mut Misconfigured, &fast_policy(5)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 250,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(250));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_millis(250));
    }

    #[test]
    fn test_in_memory_table_extracts_itself() {
        let mut table = RawTable::from_strs(&["A"], &[&["1"], &["2"]]);
        let fetched = fetch_with_retry(&mut table, &RetryPolicy::once()).unwrap();
        assert_eq!(fetched.len(), 2);
    }
}
