//! Data quality summary for one pipeline run.
//!
//! Collects the diagnostics the pipeline produces without failing: dropped
//! rows, zeroed cells, categories missing from the universe and checksum
//! mismatches.

use crate::error::Result;
use serde::Serialize;
use turnover_core::{ChecksumMismatch, UnknownColumn};
use turnover_ingestion::IngestStats;
use turnover_pivot::PipelineReport;

/// Data quality summary.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    /// Source feed name.
    pub source: String,
    /// Wide rows produced.
    pub dates: usize,
    /// Ingestion counters.
    pub ingest: IngestStats,
    /// Categories dropped from the wide schema.
    pub unknown_columns: Vec<UnknownColumn>,
    /// Checksum disagreements.
    pub checksum_mismatches: Vec<ChecksumMismatch>,
}

impl QualityReport {
    pub fn from_pipeline(source: &str, report: &PipelineReport) -> Self {
        Self {
            source: source.to_string(),
            dates: report.rows.len(),
            ingest: report.ingest.clone(),
            unknown_columns: report.unknown.clone(),
            checksum_mismatches: report.mismatches.clone(),
        }
    }

    /// Nothing dropped, nothing unaccounted for.
    pub fn is_clean(&self) -> bool {
        self.ingest.dropped_rows() == 0
            && self.ingest.unparseable_values == 0
            && self.unknown_columns.is_empty()
            && self.checksum_mismatches.is_empty()
    }

    /// Short human readable summary, one finding per line.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{}: {} rows read, {} observations, {} dates",
            self.source, self.ingest.rows_seen, self.ingest.observations, self.dates
        )];

        if self.ingest.malformed_rows > 0 {
            lines.push(format!("  {} malformed rows dropped", self.ingest.malformed_rows));
        }
        if self.ingest.skipped_dates > 0 {
            lines.push(format!("  {} rows with bad dates skipped", self.ingest.skipped_dates));
        }
        if self.ingest.unparseable_values > 0 {
            lines.push(format!(
                "  {} unreadable values set to 0",
                self.ingest.unparseable_values
            ));
        }
        for u in &self.unknown_columns {
            lines.push(format!(
                "  no column for {} ({} dates, {} dropped)",
                u.label(),
                u.dates,
                u.value
            ));
        }
        for m in &self.checksum_mismatches {
            lines.push(format!(
                "  {} {} checksum {} != total {}",
                m.date, m.instrument, m.checksum, m.total
            ));
        }
        lines.join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use turnover_core::{ColumnUniverse, CommodityGroup, Observation};
    use turnover_pivot::Pipeline;

    fn run(observations: &[Observation]) -> PipelineReport {
        let universe = ColumnUniverse::with_columns(
            &["FUTCOM"],
            vec![CommodityGroup::new("FUTCOM", &["GOLD"])],
        );
        Pipeline::new(universe, 1e-6).run(observations)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_clean_run() {
        let report = run(&[Observation::new(date(1), "FUTCOM", "GOLD", 10.0)]);
        let quality = QualityReport::from_pipeline("mcx", &report);
        assert!(quality.is_clean());
        assert_eq!(quality.dates, 1);
    }

    #[test]
    fn test_findings_listed() {
        let report = run(&[
            Observation::new(date(1), "FUTCOM", "GOLD", 10.0),
            Observation::new(date(1), "FUTCOM", "STEELREBAR", 4.0),
        ]);
        let quality = QualityReport::from_pipeline("mcx", &report);

        assert!(!quality.is_clean());
        let summary = quality.summary();
        assert!(summary.contains("no column for FUTCOM/STEELREBAR"));
        assert!(summary.contains("2025-10-01 FUTCOM checksum 10 != total 14"));

        let json: serde_json::Value = serde_json::from_str(&quality.to_json().unwrap()).unwrap();
        assert_eq!(json["checksum_mismatches"][0]["instrument"], "FUTCOM");
        assert_eq!(json["unknown_columns"][0]["commodity"], "STEELREBAR");
    }
}
