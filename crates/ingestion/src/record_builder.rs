//! Long-format observation building.
//!
//! Binds the configured source fields to header positions once, then turns
//! each raw row into an [`Observation`]. Rows with the wrong number of fields
//! are dropped; rows with a bad date are dropped or abort the batch depending
//! on the source's [`DatePolicy`].

use crate::normalize::{normalize_with_outcome, ValueOutcome};
use crate::raw_table::RawTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use turnover_core::{DatePolicy, Error, FieldBinding, Observation, Result, SourceConfig};

/// Counters describing one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Raw rows offered to the builder.
    pub rows_seen: u64,
    /// Observations produced.
    pub observations: u64,
    /// Rows dropped for a field-count mismatch.
    pub malformed_rows: u64,
    /// Rows dropped for an unparseable date.
    pub skipped_dates: u64,
    /// Value cells that were empty or a no-trade placeholder.
    pub placeholder_values: u64,
    /// Value cells that could not be read and were set to zero.
    pub unparseable_values: u64,
}

impl IngestStats {
    /// Rows that did not become observations.
    pub fn dropped_rows(&self) -> u64 {
        self.malformed_rows + self.skipped_dates
    }
}

/// Result of ingesting a whole table.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub observations: Vec<Observation>,
    pub stats: IngestStats,
    /// Row-level errors for every dropped row, in row order.
    pub rejected: Vec<Error>,
}

/// A source field resolved against the header.
#[derive(Debug, Clone)]
enum ResolvedField {
    Index(usize),
    Fixed(String),
}

impl ResolvedField {
    fn get<'a>(&'a self, fields: &'a [String]) -> &'a str {
        match self {
            ResolvedField::Index(i) => fields[*i].as_str(),
            ResolvedField::Fixed(value) => value.as_str(),
        }
    }
}

/// Builds observations for one source table.
pub struct ObservationBuilder {
    /// Source name for diagnostics.
    source_name: String,
    /// Expected number of fields per row.
    width: usize,
    date: usize,
    instrument: ResolvedField,
    commodity: ResolvedField,
    value: usize,
    date_format: String,
    date_suffix: Option<String>,
    date_policy: DatePolicy,
    stats: IngestStats,
}

impl ObservationBuilder {
    /// Resolve the source's bindings against a header.
    pub fn new(source: &SourceConfig, headers: &[String]) -> Result<Self> {
        let lookup = RawTable::new(headers.to_vec(), Vec::new());
        let index_of = |column: &str| {
            lookup.column_index(column).ok_or_else(|| Error::MissingColumn {
                source_name: source.name.clone(),
                column: column.to_string(),
            })
        };
        let resolve = |binding: &FieldBinding| -> Result<ResolvedField> {
            match binding {
                FieldBinding::Column(name) => index_of(name).map(ResolvedField::Index),
                FieldBinding::Fixed(value) => Ok(ResolvedField::Fixed(value.clone())),
            }
        };

        Ok(Self {
            source_name: source.name.clone(),
            width: headers.len(),
            date: index_of(&source.date_column)?,
            instrument: resolve(&source.instrument)?,
            commodity: resolve(&source.commodity)?,
            value: index_of(&source.value_column)?,
            date_format: source.date_format.clone(),
            date_suffix: source.date_suffix.clone(),
            date_policy: source.date_policy,
            stats: IngestStats::default(),
        })
    }

    /// Parse a date cell with the source's format.
    pub fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        let parsed = match &self.date_suffix {
            Some(suffix) => NaiveDate::parse_from_str(&format!("{}{}", text, suffix), &self.date_format),
            None => NaiveDate::parse_from_str(text, &self.date_format),
        };
        parsed.ok()
    }

    /// Build one observation. `row` is the 1-based data row number.
    pub fn build_row(&mut self, row: usize, fields: &[String]) -> Result<Observation> {
        self.stats.rows_seen += 1;

        if fields.len() != self.width {
            self.stats.malformed_rows += 1;
            return Err(Error::MalformedRow {
                row,
                expected: self.width,
                found: fields.len(),
            });
        }

        let date_text = &fields[self.date];
        let date = match self.parse_date(date_text) {
            Some(date) => date,
            None => {
                self.stats.skipped_dates += 1;
                return Err(Error::UnparseableDate {
                    row,
                    text: date_text.clone(),
                    format: self.date_format.clone(),
                });
            }
        };

        let (value, outcome) = normalize_with_outcome(&fields[self.value]);
        match outcome {
            ValueOutcome::Parsed => {}
            ValueOutcome::Placeholder => self.stats.placeholder_values += 1,
            ValueOutcome::Unparseable => {
                self.stats.unparseable_values += 1;
                debug!(source = %self.source_name, row, cell = %fields[self.value], "unparseable value set to zero");
            }
        }

        self.stats.observations += 1;
        Ok(Observation::new(
            date,
            self.instrument.get(fields),
            self.commodity.get(fields),
            value,
        ))
    }

    /// Ingest a whole table, applying the drop/abort policy per row.
    pub fn build_table(source: &SourceConfig, table: &RawTable) -> Result<IngestOutcome> {
        let mut builder = Self::new(source, &table.headers)?;
        let mut observations = Vec::with_capacity(table.len());
        let mut rejected = Vec::new();

        for (i, fields) in table.rows.iter().enumerate() {
            match builder.build_row(i + 1, fields) {
                Ok(obs) => observations.push(obs),
                Err(err) if err.is_row_level() => {
                    let abort = builder.date_policy == DatePolicy::Abort
                        && matches!(err, Error::UnparseableDate { .. });
                    if abort {
                        return Err(err);
                    }
                    warn!(source = %builder.source_name, error = %err, "dropping row");
                    rejected.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        let stats = builder.stats.clone();
        info!(
            source = %builder.source_name,
            rows = stats.rows_seen,
            observations = stats.observations,
            dropped = stats.dropped_rows(),
            "ingested table"
        );

        Ok(IngestOutcome {
            observations,
            stats,
            rejected,
        })
    }

    /// Get ingestion statistics.
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MCX_HEADERS: [&str; 7] = [
        "Date",
        "Segment",
        "Instrument",
        "Commodity",
        "Contracts",
        "Volume",
        "Total Value (Lacs)",
    ];

    fn mcx_table(rows: &[&[&str]]) -> RawTable {
        RawTable::from_strs(&MCX_HEADERS, rows)
    }

    #[test]
    fn test_build_mcx_rows() {
        let table = mcx_table(&[
            &["01 Oct 2025", "Commodity", "futcom", "Gold", "10", "1", "1,234.50"],
            &["01 Oct 2025", "Commodity", "OPTFUT", "SILVER", "5", "1", "-"],
        ]);

        let outcome = ObservationBuilder::build_table(&SourceConfig::mcx(), &table).unwrap();

        assert_eq!(outcome.observations.len(), 2);
        let gold = &outcome.observations[0];
        assert_eq!(gold.date, NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert_eq!(gold.instrument, "FUTCOM");
        assert_eq!(gold.commodity, "GOLD");
        assert_relative_eq!(gold.value, 1234.5);
        assert_eq!(outcome.observations[1].value, 0.0);
        assert_eq!(outcome.stats.placeholder_values, 1);
    }

    #[test]
    fn test_short_row_dropped() {
        let table = mcx_table(&[
            &["01 Oct 2025", "Commodity", "FUTCOM", "GOLD", "10"],
            &["02 Oct 2025", "Commodity", "FUTCOM", "GOLD", "10", "1", "30"],
        ]);

        let outcome = ObservationBuilder::build_table(&SourceConfig::mcx(), &table).unwrap();

        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.observations[0].value, 30.0);
        assert_eq!(outcome.stats.malformed_rows, 1);
        assert!(matches!(
            outcome.rejected[0],
            Error::MalformedRow { row: 1, expected: 7, found: 5 }
        ));
    }

    #[test]
    fn test_bad_date_aborts_by_default() {
        let table = mcx_table(&[&["2025-10-01", "Commodity", "FUTCOM", "GOLD", "1", "1", "5"]]);
        let err = ObservationBuilder::build_table(&SourceConfig::mcx(), &table).unwrap_err();
        assert!(matches!(err, Error::UnparseableDate { row: 1, .. }));
    }

    #[test]
    fn test_bad_date_skipped_when_configured() {
        let mut source = SourceConfig::mcx();
        source.date_policy = DatePolicy::Skip;
        let table = mcx_table(&[
            &["Total", "", "", "", "", "", "99"],
            &["03 Oct 2025", "Commodity", "FUTIDX", "MCXBULLDEX", "1", "1", "7"],
        ]);

        let outcome = ObservationBuilder::build_table(&source, &table).unwrap();

        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.stats.skipped_dates, 1);
        assert_eq!(outcome.stats.dropped_rows(), 1);
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_skip_collects_every_row_level_error() {
        let mut source = SourceConfig::mcx();
        source.date_policy = DatePolicy::Skip;
        let table = mcx_table(&[
            &["01 Oct 2025", "Commodity", "FUTCOM"],
            &["Total", "", "", "", "", "", "99"],
            &["02 Oct 2025", "Commodity", "FUTCOM", "GOLD", "1", "1", "30"],
        ]);

        let outcome = ObservationBuilder::build_table(&source, &table).unwrap();

        assert_eq!(outcome.observations.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert!(outcome.rejected.iter().all(Error::is_row_level));
        assert!(matches!(outcome.rejected[0], Error::MalformedRow { row: 1, .. }));
        assert!(matches!(outcome.rejected[1], Error::UnparseableDate { row: 2, .. }));
    }

    #[test]
    fn test_missing_column_is_error() {
        let table = RawTable::from_strs(&["Date", "Instrument", "Total Value (Lacs)"], &[]);
        let err = ObservationBuilder::build_table(&SourceConfig::mcx(), &table).unwrap_err();
        match err {
            Error::MissingColumn { column, .. } => assert_eq!(column, "Commodity"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nse_fixed_instrument() {
        let table = RawTable::from_strs(
            &["Date", "IFC", "Index Options Premium Turnover", "TT"],
            &[&["01-Oct-2025", "100", "52,301.75", "9"]],
        );

        let outcome = ObservationBuilder::build_table(&SourceConfig::nse_fo(), &table).unwrap();

        let obs = &outcome.observations[0];
        assert_eq!(obs.instrument, "NSE_IDXOPT_PREMIUM");
        assert_eq!(obs.commodity, "");
        assert_relative_eq!(obs.value, 52301.75);
    }

    #[test]
    fn test_bse_date_suffix() {
        let table = RawTable::from_strs(
            &["Date", "Index Options Premium Turnover"],
            &[&["Oct 01", "1,000"]],
        );

        let outcome =
            ObservationBuilder::build_table(&SourceConfig::bse_derivatives(2025), &table).unwrap();

        assert_eq!(
            outcome.observations[0].date,
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );
    }

    #[test]
    fn test_unparseable_value_counted() {
        let table = mcx_table(&[&["01 Oct 2025", "Commodity", "FUTCOM", "GOLD", "1", "1", "abc"]]);
        let mut builder = ObservationBuilder::new(&SourceConfig::mcx(), &table.headers).unwrap();

        let obs = builder.build_row(1, &table.rows[0]).unwrap();

        assert_eq!(obs.value, 0.0);
        assert_eq!(builder.stats().unparseable_values, 1);
        assert_eq!(builder.stats().observations, 1);
    }
}
