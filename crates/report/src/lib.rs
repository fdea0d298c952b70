//! Output side of the turnover pipeline.
//!
//! This crate provides:
//! - Rendering wide rows and combined series as text tables
//! - CSV and SQLite report sinks
//! - A CSV-backed row extractor
//! - Data quality summaries

pub mod error;
pub mod extractor;
pub mod quality;
pub mod sink;
pub mod table;

pub use error::{ReportError, Result};
pub use extractor::CsvRowExtractor;
pub use quality::QualityReport;
pub use sink::{CsvSink, ReportSink, SqliteSink};
pub use table::{ColumnKind, Table};
