//! Core types and configuration for the turnover pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Long-format observations and pivot keys
//! - Assembled and finalized wide rows
//! - Configuration structures (sources, column universe, output)
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ColumnUniverse, CommodityGroup, Config, DatePolicy, FieldBinding, OutputConfig, SourceConfig,
};
pub use error::{Error, Result};
pub use types::*;
