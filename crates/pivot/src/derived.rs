//! Checksums, unit conversion and grand totals.

use turnover_core::{AssembledRow, ChecksumMismatch, ColumnUniverse, GroupColumns, WideRow};

/// Compute the derived columns of an assembled row.
pub fn finalize(row: &AssembledRow, universe: &ColumnUniverse) -> WideRow {
    let divisor = universe.unit_divisor;

    let groups = row
        .groups
        .iter()
        .map(|values| GroupColumns {
            values: values.clone(),
            checksum: values.iter().sum(),
        })
        .collect();

    let converted = row.totals.iter().map(|t| t / divisor).collect();
    let grand_total: f64 = row.totals.iter().sum();

    WideRow {
        date: row.date,
        year: row.year,
        totals: row.totals.clone(),
        groups,
        converted,
        grand_total,
        grand_total_converted: grand_total / divisor,
    }
}

/// Groups whose checksum differs from their instrument total by more than
/// `tolerance`. Groups whose instrument has no total column are not checked.
pub fn checksum_mismatches(
    row: &WideRow,
    universe: &ColumnUniverse,
    tolerance: f64,
) -> Vec<ChecksumMismatch> {
    universe
        .groups
        .iter()
        .zip(&row.groups)
        .filter_map(|(group, columns)| {
            let total = row.totals[universe.instrument_index(&group.instrument)?];
            if (total - columns.checksum).abs() > tolerance {
                Some(ChecksumMismatch {
                    date: row.date,
                    instrument: group.instrument.clone(),
                    total,
                    checksum: columns.checksum,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use turnover_core::CommodityGroup;

    fn universe() -> ColumnUniverse {
        ColumnUniverse::with_columns(
            &["FUTCOM", "FUTIDX", "OPTFUT"],
            vec![
                CommodityGroup::new("FUTCOM", &["GOLD", "SILVER", "COPPER"]),
                CommodityGroup::new("OPTFUT", &["GOLD", "SILVER"]),
            ],
        )
    }

    fn assembled(totals: Vec<f64>, futcom: Vec<f64>, optfut: Vec<f64>) -> AssembledRow {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        AssembledRow {
            date,
            year: 2025,
            totals,
            groups: vec![futcom, optfut],
        }
    }

    #[test]
    fn test_checksums() {
        let row = finalize(
            &assembled(vec![150.0, 0.0, 12.0], vec![100.0, 50.0, 0.0], vec![10.0, 2.0]),
            &universe(),
        );
        assert_relative_eq!(row.groups[0].checksum, 150.0);
        assert_relative_eq!(row.groups[1].checksum, 12.0);
        assert!(checksum_mismatches(&row, &universe(), 1e-6).is_empty());
    }

    #[test]
    fn test_unit_conversion() {
        let row = finalize(
            &assembled(vec![12345.0, 0.0, 0.0], vec![12345.0, 0.0, 0.0], vec![0.0, 0.0]),
            &universe(),
        );
        assert_relative_eq!(row.converted[0], 123.45);
        assert_eq!(row.converted[1], 0.0);
    }

    #[test]
    fn test_grand_totals() {
        let row = finalize(
            &assembled(vec![1000.0, 250.0, 50.0], vec![1000.0, 0.0, 0.0], vec![50.0, 0.0]),
            &universe(),
        );
        assert_relative_eq!(row.grand_total, 1300.0);
        assert_relative_eq!(row.grand_total_converted, 13.0);
    }

    #[test]
    fn test_mismatch_flags_stale_universe() {
        // 40 lakh of FUTCOM turnover traded in a commodity with no column.
        let row = finalize(
            &assembled(vec![190.0, 0.0, 0.0], vec![100.0, 50.0, 0.0], vec![0.0, 0.0]),
            &universe(),
        );
        let mismatches = checksum_mismatches(&row, &universe(), 1e-6);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].instrument, "FUTCOM");
        assert_relative_eq!(mismatches[0].difference(), 40.0);
    }

    #[test]
    fn test_custom_divisor() {
        let mut universe = universe();
        universe.unit_divisor = 1000.0;
        let row = finalize(
            &assembled(vec![5000.0, 0.0, 0.0], vec![5000.0, 0.0, 0.0], vec![0.0, 0.0]),
            &universe,
        );
        assert_relative_eq!(row.converted[0], 5.0);
    }
}
