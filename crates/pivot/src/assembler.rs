//! Wide-schema assembly.
//!
//! Lays pivot results out as one row per date under the closed column
//! universe. Columns with no pivot entry for a date are zero. Categories that
//! have no column in the universe are reported, not added.

use crate::aggregator::PivotTable;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;
use turnover_core::{AssembledRow, ColumnUniverse, UnknownColumn};

/// Pivot outputs for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotResults {
    /// Instrument totals pivot.
    pub totals: PivotTable,
    /// Commodity pivots, aligned with `ColumnUniverse::groups`.
    pub groups: Vec<PivotTable>,
}

/// Assembled rows plus categories that fell outside the universe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub rows: Vec<AssembledRow>,
    pub unknown: Vec<UnknownColumn>,
}

/// Tally of values dropped for a category without a column.
#[derive(Debug, Default)]
struct UnknownTally {
    dates: usize,
    value: f64,
}

/// Build one zero-filled row per distinct date.
///
/// Rows come out in ascending date order regardless of the order of `dates`;
/// duplicate dates collapse into one row.
pub fn assemble(
    dates: &[NaiveDate],
    results: &PivotResults,
    universe: &ColumnUniverse,
) -> Assembly {
    let group_sizes = universe.group_sizes();
    let mut rows: BTreeMap<NaiveDate, AssembledRow> = dates
        .iter()
        .map(|&d| (d, AssembledRow::zeroed(d, universe.instruments.len(), &group_sizes)))
        .collect();

    let mut unknown: BTreeMap<(String, Option<String>), UnknownTally> = BTreeMap::new();

    let instrument_index: HashMap<&str, usize> = universe
        .instruments
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for (key, &value) in &results.totals {
        let Some(row) = rows.get_mut(&key.date) else { continue };
        match instrument_index.get(key.value.as_str()) {
            Some(&i) => row.totals[i] = value,
            None => {
                let tally = unknown.entry((key.value.clone(), None)).or_default();
                tally.dates += 1;
                tally.value += value;
            }
        }
    }

    for (g, group) in universe.groups.iter().enumerate() {
        let Some(pivot) = results.groups.get(g) else { continue };
        let commodity_index: HashMap<&str, usize> = group
            .commodities
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        for (key, &value) in pivot {
            let Some(row) = rows.get_mut(&key.date) else { continue };
            match commodity_index.get(key.value.as_str()) {
                Some(&i) => row.groups[g][i] = value,
                None => {
                    let tally = unknown
                        .entry((group.instrument.clone(), Some(key.value.clone())))
                        .or_default();
                    tally.dates += 1;
                    tally.value += value;
                }
            }
        }
    }

    let unknown: Vec<UnknownColumn> = unknown
        .into_iter()
        .map(|((instrument, commodity), tally)| UnknownColumn {
            instrument,
            commodity,
            dates: tally.dates,
            value: tally.value,
        })
        .collect();

    for column in &unknown {
        warn!(
            column = %column.label(),
            dates = column.dates,
            value = column.value,
            "category has no column in the universe"
        );
    }

    Assembly {
        rows: rows.into_values().collect(),
        unknown,
    }
}
