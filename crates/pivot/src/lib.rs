//! Long-to-wide reshaping for the turnover pipeline.
//!
//! This crate handles:
//! - Per-date pivots over instruments and commodities
//! - Zero-filled assembly under a fixed column universe
//! - Checksums, unit conversion and grand totals
//! - The end-to-end pipeline engine
//! - Joining two daily series (exchange premium comparison)

pub mod aggregator;
pub mod assembler;
pub mod combine;
pub mod derived;
pub mod engine;

pub use aggregator::{aggregate, distinct_dates, Dimension, PivotSpec, PivotTable};
pub use assembler::{assemble, Assembly, PivotResults};
pub use combine::{combine_daily, CombinedRow, DailySeries};
pub use derived::{checksum_mismatches, finalize};
pub use engine::{Pipeline, PipelineReport};
