//! Data ingestion and normalization for the turnover pipeline.
//!
//! This crate handles:
//! - Cleaning locale-formatted numeric cells
//! - The row extractor boundary (raw tables, retries)
//! - Building long-format observations from raw rows

pub mod normalize;
pub mod raw_table;
pub mod record_builder;

pub use normalize::{normalize, normalize_with_outcome, ValueOutcome};
pub use raw_table::{fetch_with_retry, RawTable, RetryPolicy, RowExtractor};
pub use record_builder::{IngestOutcome, IngestStats, ObservationBuilder};
