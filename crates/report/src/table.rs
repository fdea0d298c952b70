//! Text rendering of pipeline output.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use turnover_core::{ColumnUniverse, OutputConfig, WideRow};
use turnover_pivot::CombinedRow;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    /// SQLite column type.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Real => "REAL",
        }
    }
}

/// A header plus rendered rows, ready for a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Render wide rows under the universe's header.
    pub fn wide(rows: &[WideRow], universe: &ColumnUniverse, output: &OutputConfig) -> Self {
        let header = universe.header();
        let mut kinds = vec![ColumnKind::Real; header.len()];
        kinds[0] = ColumnKind::Text;
        kinds[1] = ColumnKind::Integer;

        let rows = rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(header.len());
                cells.push(row.date.format(&output.date_format).to_string());
                cells.push(row.year.to_string());
                cells.extend(
                    row.values()
                        .into_iter()
                        .map(|v| format_value(v, output.decimal_places)),
                );
                cells
            })
            .collect();

        Self { header, kinds, rows }
    }

    /// Render a joined daily series: Date, Day, both series, Total.
    pub fn combined(
        rows: &[CombinedRow],
        left_label: &str,
        right_label: &str,
        output: &OutputConfig,
    ) -> Self {
        let header = vec![
            "Date".to_string(),
            "Day".to_string(),
            left_label.to_string(),
            right_label.to_string(),
            "Total".to_string(),
        ];
        let kinds = vec![
            ColumnKind::Text,
            ColumnKind::Text,
            ColumnKind::Real,
            ColumnKind::Real,
            ColumnKind::Real,
        ];

        let rows = rows
            .iter()
            .map(|row| {
                vec![
                    row.date.format(&output.date_format).to_string(),
                    weekday_name(row.weekday).to_string(),
                    format_value(row.left, output.decimal_places),
                    format_value(row.right, output.decimal_places),
                    format_value(row.total, output.decimal_places),
                ]
            })
            .collect();

        Self { header, kinds, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render a number, rounded only when `decimals` is set.
pub fn format_value(value: f64, decimals: Option<usize>) -> String {
    match decimals {
        Some(places) => format!("{:.*}", places, value),
        None => value.to_string(),
    }
}

/// Full English day name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
