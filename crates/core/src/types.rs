//! Core data types for the turnover pipeline.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Futures on commodities.
pub const FUTCOM: &str = "FUTCOM";
/// Futures on commodity indices.
pub const FUTIDX: &str = "FUTIDX";
/// Options on commodity futures.
pub const OPTFUT: &str = "OPTFUT";

/// Upper-case and trim a category label so it can be used as a grouping key.
#[inline]
pub fn category_key(label: &str) -> String {
    label.trim().to_uppercase()
}

/// One scraped observation in long format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObservationRecord")]
pub struct Observation {
    /// Trading date.
    pub date: NaiveDate,
    /// Instrument category (e.g. FUTCOM), upper-case.
    pub instrument: String,
    /// Commodity within the instrument (e.g. GOLD), upper-case.
    pub commodity: String,
    /// Turnover in the source unit, never negative.
    pub value: f64,
}

impl Observation {
    /// Create an observation, normalizing category case and clamping the value.
    pub fn new(date: NaiveDate, instrument: &str, commodity: &str, value: f64) -> Self {
        let value = if value.is_finite() && value > 0.0 { value } else { 0.0 };
        Self {
            date,
            instrument: category_key(instrument),
            commodity: category_key(commodity),
            value,
        }
    }
}

/// Serialized form of an [`Observation`]; read back through [`Observation::new`].
#[derive(Deserialize)]
struct ObservationRecord {
    date: NaiveDate,
    instrument: String,
    commodity: String,
    value: f64,
}

impl From<ObservationRecord> for Observation {
    fn from(r: ObservationRecord) -> Self {
        Observation::new(r.date, &r.instrument, &r.commodity, r.value)
    }
}

/// Grouping key used by the aggregator.
///
/// `value` is an instrument name or a commodity name, depending on the pivot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PivotKey {
    pub date: NaiveDate,
    pub value: String,
}

impl PivotKey {
    pub fn new(date: NaiveDate, value: impl Into<String>) -> Self {
        Self {
            date,
            value: value.into(),
        }
    }
}

/// A wide row after zero-filling but before derived columns are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Calendar year of `date`.
    pub year: i32,
    /// Instrument totals, aligned to the universe's instrument list.
    pub totals: Vec<f64>,
    /// Commodity values, one vector per commodity group, aligned to the group's list.
    pub groups: Vec<Vec<f64>>,
}

impl AssembledRow {
    /// Create an all-zero row shaped by the given column counts.
    pub fn zeroed(date: NaiveDate, total_count: usize, group_sizes: &[usize]) -> Self {
        Self {
            date,
            year: date.year(),
            totals: vec![0.0; total_count],
            groups: group_sizes.iter().map(|&n| vec![0.0; n]).collect(),
        }
    }
}

/// Commodity columns of one group plus their checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupColumns {
    pub values: Vec<f64>,
    /// Sum of `values`.
    pub checksum: f64,
}

/// A finalized wide row: one per trading date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub date: NaiveDate,
    pub year: i32,
    /// Instrument totals in the source unit.
    pub totals: Vec<f64>,
    /// Commodity groups with checksums.
    pub groups: Vec<GroupColumns>,
    /// Instrument totals in the converted unit.
    pub converted: Vec<f64>,
    /// Sum of all instrument totals in the source unit.
    pub grand_total: f64,
    /// `grand_total` in the converted unit.
    pub grand_total_converted: f64,
}

impl WideRow {
    /// Numeric cells in output column order (everything after Date and Year).
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.numeric_column_count());
        out.extend_from_slice(&self.totals);
        for group in &self.groups {
            out.extend_from_slice(&group.values);
            out.push(group.checksum);
        }
        out.extend_from_slice(&self.converted);
        out.push(self.grand_total);
        out.push(self.grand_total_converted);
        out
    }

    /// Number of numeric cells produced by [`WideRow::values`].
    pub fn numeric_column_count(&self) -> usize {
        self.totals.len()
            + self.groups.iter().map(|g| g.values.len() + 1).sum::<usize>()
            + self.converted.len()
            + 2
    }
}

/// A commodity group whose enumerated columns do not add up to the reported total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksumMismatch {
    pub date: NaiveDate,
    pub instrument: String,
    /// Instrument total as aggregated from all observations.
    pub total: f64,
    /// Sum of the enumerated commodity columns.
    pub checksum: f64,
}

impl ChecksumMismatch {
    /// Turnover not covered by the enumerated columns.
    pub fn difference(&self) -> f64 {
        self.total - self.checksum
    }
}

/// A category seen in the data that has no column in the universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownColumn {
    pub instrument: String,
    /// `None` when the instrument itself has no total column.
    pub commodity: Option<String>,
    /// Number of dates on which it traded.
    pub dates: usize,
    /// Total value dropped from the wide schema.
    pub value: f64,
}

impl UnknownColumn {
    /// Human readable label, e.g. `FUTCOM/LEADNEW`.
    pub fn label(&self) -> String {
        match &self.commodity {
            Some(commodity) => format!("{}/{}", self.instrument, commodity),
            None => self.instrument.clone(),
        }
    }
}
