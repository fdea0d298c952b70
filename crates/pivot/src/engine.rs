//! Pipeline engine.
//!
//! Combines ingestion, pivots, assembly and derivation into one batch run.

use crate::aggregator::{aggregate, distinct_dates, PivotSpec};
use crate::assembler::{assemble, PivotResults};
use crate::derived::{checksum_mismatches, finalize};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use turnover_core::{
    ChecksumMismatch, ColumnUniverse, Config, Observation, Result, SourceConfig, UnknownColumn,
    WideRow,
};
use turnover_ingestion::{IngestStats, ObservationBuilder, RawTable};

/// Everything one batch produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Wide rows, ascending by date.
    pub rows: Vec<WideRow>,
    /// Categories seen in the data without a column.
    pub unknown: Vec<UnknownColumn>,
    /// Dates where a group's checksum disagrees with its total.
    pub mismatches: Vec<ChecksumMismatch>,
    /// Ingestion counters; default when the run started from observations.
    pub ingest: IngestStats,
}

impl PipelineReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// No unknown categories and no checksum mismatches.
    pub fn is_consistent(&self) -> bool {
        self.unknown.is_empty() && self.mismatches.is_empty()
    }
}

/// Long-to-wide pipeline over a fixed column universe.
pub struct Pipeline {
    universe: ColumnUniverse,
    checksum_tolerance: f64,
}

impl Pipeline {
    /// Create a pipeline for a universe.
    pub fn new(universe: ColumnUniverse, checksum_tolerance: f64) -> Self {
        Self {
            universe,
            checksum_tolerance,
        }
    }

    /// Create a pipeline from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.universe.validate()?;
        Ok(Self::new(
            config.universe.clone(),
            config.output.checksum_tolerance,
        ))
    }

    pub fn universe(&self) -> &ColumnUniverse {
        &self.universe
    }

    /// Run every pivot the universe needs.
    ///
    /// The instrument-total pivot and the commodity pivots write disjoint
    /// columns, so they run concurrently; group results keep universe order.
    pub fn pivot(&self, observations: &[Observation]) -> PivotResults {
        let (totals, groups) = rayon::join(
            || aggregate(observations, &PivotSpec::instrument_totals()),
            || {
                self.universe
                    .groups
                    .par_iter()
                    .map(|g| aggregate(observations, &PivotSpec::commodities_of(&g.instrument)))
                    .collect::<Vec<_>>()
            },
        );
        debug!(
            total_entries = totals.len(),
            group_entries = groups.iter().map(|g| g.len()).sum::<usize>(),
            "pivots computed"
        );
        PivotResults { totals, groups }
    }

    /// Reshape observations into finalized wide rows.
    pub fn run(&self, observations: &[Observation]) -> PipelineReport {
        if observations.is_empty() {
            info!("no observations, empty report");
            return PipelineReport::default();
        }

        let dates = distinct_dates(observations);
        let results = self.pivot(observations);
        let assembly = assemble(&dates, &results, &self.universe);

        let rows: Vec<WideRow> = assembly
            .rows
            .iter()
            .map(|row| finalize(row, &self.universe))
            .collect();

        let mismatches: Vec<ChecksumMismatch> = rows
            .iter()
            .flat_map(|row| checksum_mismatches(row, &self.universe, self.checksum_tolerance))
            .collect();

        for m in &mismatches {
            warn!(
                date = %m.date,
                instrument = %m.instrument,
                total = m.total,
                checksum = m.checksum,
                "checksum mismatch"
            );
        }

        info!(
            observations = observations.len(),
            rows = rows.len(),
            unknown = assembly.unknown.len(),
            mismatches = mismatches.len(),
            "pipeline finished"
        );

        PipelineReport {
            rows,
            unknown: assembly.unknown,
            mismatches,
            ingest: IngestStats::default(),
        }
    }

    /// Ingest a raw table, then reshape it.
    pub fn run_table(&self, source: &SourceConfig, table: &RawTable) -> Result<PipelineReport> {
        let outcome = ObservationBuilder::build_table(source, table)?;
        let mut report = self.run(&outcome.observations);
        report.ingest = outcome.stats;
        Ok(report)
    }
}
