//! Joining two single-value daily series.
//!
//! Used to put the BSE and NSE index-option premium turnover side by side:
//! only dates present in both series are kept.

use crate::aggregator::{aggregate, PivotSpec};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};
use turnover_core::Observation;

/// One value per date, with a display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub label: String,
    pub values: BTreeMap<NaiveDate, f64>,
}

impl DailySeries {
    pub fn new(label: impl Into<String>, values: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Sum all observations per date, across instruments.
    pub fn from_observations(label: impl Into<String>, observations: &[Observation]) -> Self {
        let mut values = BTreeMap::new();
        for (key, value) in aggregate(observations, &PivotSpec::instrument_totals()) {
            *values.entry(key.date).or_insert(0.0) += value;
        }
        Self::new(label, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One joined date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRow {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub left: f64,
    pub right: f64,
    /// `left + right`.
    pub total: f64,
}

/// Inner join of two series on date, ascending.
pub fn combine_daily(left: &DailySeries, right: &DailySeries) -> Vec<CombinedRow> {
    let rows: Vec<CombinedRow> = left
        .values
        .iter()
        .filter_map(|(&date, &l)| {
            let &r = right.values.get(&date)?;
            Some(CombinedRow {
                date,
                weekday: date.weekday(),
                left: l,
                right: r,
                total: l + r,
            })
        })
        .collect();

    if rows.is_empty() {
        warn!(left = %left.label, right = %right.label, "no matching dates between series");
    } else {
        info!(rows = rows.len(), "combined daily series");
    }
    rows
}
