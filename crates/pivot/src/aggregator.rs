//! Per-date pivots over the observation set.
//!
//! Each pivot groups observations by `(date, dimension value)` and sums their
//! values. Observations are only borrowed, so any number of pivots can run
//! over the same slice, in parallel if desired.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use turnover_core::{category_key, Observation, PivotKey};

/// Summed values by `(date, dimension value)`.
pub type PivotTable = BTreeMap<PivotKey, f64>;

/// Which observation field becomes the column key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    Instrument,
    Commodity,
}

/// What to group by and which observations qualify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub dimension: Dimension,
    /// Only observations of this instrument qualify. `None` takes all.
    pub instrument: Option<String>,
}

impl PivotSpec {
    /// One value per instrument per date.
    pub fn instrument_totals() -> Self {
        Self {
            dimension: Dimension::Instrument,
            instrument: None,
        }
    }

    /// One value per commodity of `instrument` per date.
    pub fn commodities_of(instrument: &str) -> Self {
        Self {
            dimension: Dimension::Commodity,
            instrument: Some(category_key(instrument)),
        }
    }

    #[inline]
    fn qualifies(&self, obs: &Observation) -> bool {
        match &self.instrument {
            Some(instrument) => obs.instrument == *instrument,
            None => true,
        }
    }

    #[inline]
    fn key_value<'a>(&self, obs: &'a Observation) -> &'a str {
        match self.dimension {
            Dimension::Instrument => &obs.instrument,
            Dimension::Commodity => &obs.commodity,
        }
    }
}

/// Sum qualifying observations by `(date, dimension value)`.
///
/// Plain `f64` addition in input order. Dates with no qualifying observation
/// have no entry.
pub fn aggregate(observations: &[Observation], spec: &PivotSpec) -> PivotTable {
    let mut sums = PivotTable::new();

    for obs in observations.iter().filter(|o| spec.qualifies(o)) {
        *sums
            .entry(PivotKey::new(obs.date, spec.key_value(obs)))
            .or_insert(0.0) += obs.value;
    }

    sums
}

/// Every date present in the observations, ascending.
pub fn distinct_dates(observations: &[Observation]) -> Vec<NaiveDate> {
    observations
        .iter()
        .map(|o| o.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn obs(d: u32, instrument: &str, commodity: &str, value: f64) -> Observation {
        Observation::new(date(d), instrument, commodity, value)
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs(1, "FUTCOM", "GOLD", 100.0),
            obs(1, "FUTCOM", "GOLD", 20.0),
            obs(1, "FUTCOM", "SILVER", 50.0),
            obs(1, "OPTFUT", "GOLD", 7.0),
            obs(2, "FUTCOM", "GOLD", 30.0),
            obs(2, "FUTIDX", "MCXBULLDEX", 4.0),
        ]
    }

    #[test]
    fn test_instrument_totals() {
        let totals = aggregate(&sample(), &PivotSpec::instrument_totals());

        assert_relative_eq!(totals[&PivotKey::new(date(1), "FUTCOM")], 170.0);
        assert_relative_eq!(totals[&PivotKey::new(date(1), "OPTFUT")], 7.0);
        assert_relative_eq!(totals[&PivotKey::new(date(2), "FUTCOM")], 30.0);
        assert_relative_eq!(totals[&PivotKey::new(date(2), "FUTIDX")], 4.0);
        assert_eq!(totals.len(), 4);
    }

    #[test]
    fn test_commodity_pivot_is_scoped() {
        let futcom = aggregate(&sample(), &PivotSpec::commodities_of("futcom"));

        assert_relative_eq!(futcom[&PivotKey::new(date(1), "GOLD")], 120.0);
        assert_relative_eq!(futcom[&PivotKey::new(date(1), "SILVER")], 50.0);
        assert_relative_eq!(futcom[&PivotKey::new(date(2), "GOLD")], 30.0);
        // OPTFUT gold and FUTIDX rows do not leak in.
        assert_eq!(futcom.len(), 3);
    }

    #[test]
    fn test_absent_dates_have_no_entry() {
        let optfut = aggregate(&sample(), &PivotSpec::commodities_of("OPTFUT"));
        assert!(!optfut.contains_key(&PivotKey::new(date(2), "GOLD")));
        assert_eq!(optfut.len(), 1);
    }

    #[test]
    fn test_repeated_pivots_leave_input_untouched() {
        let observations = sample();
        let before = observations.clone();

        let a = aggregate(&observations, &PivotSpec::instrument_totals());
        let b = aggregate(&observations, &PivotSpec::commodities_of("FUTCOM"));
        let a_again = aggregate(&observations, &PivotSpec::instrument_totals());

        assert_eq!(observations, before);
        assert_eq!(a, a_again);
        assert!(!b.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], &PivotSpec::instrument_totals()).is_empty());
        assert!(distinct_dates(&[]).is_empty());
    }

    #[test]
    fn test_distinct_dates_sorted() {
        let mut observations = sample();
        observations.reverse();
        assert_eq!(distinct_dates(&observations), vec![date(1), date(2)]);
    }
}
