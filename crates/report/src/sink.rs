//! Report sinks.
//!
//! A sink persists a rendered [`Table`]. CSV mirrors the spreadsheet the
//! exchange scrapes were originally exported to; SQLite keeps typed columns
//! for later querying.

use crate::error::{ReportError, Result};
use crate::table::Table;
use rusqlite::{params_from_iter, Connection};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Consumes finished tables.
pub trait ReportSink {
    fn write_table(&mut self, table: &Table) -> Result<()>;
}

fn check_shape(table: &Table) -> Result<()> {
    if table.kinds.len() != table.header.len() {
        return Err(ReportError::InvalidTable(format!(
            "{} column kinds for {} columns",
            table.kinds.len(),
            table.header.len()
        )));
    }
    if let Some((i, row)) = table
        .rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != table.header.len())
    {
        return Err(ReportError::InvalidTable(format!(
            "row {} has {} cells, header has {}",
            i + 1,
            row.len(),
            table.header.len()
        )));
    }
    Ok(())
}

/// Writes tables as CSV.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write_table(&mut self, table: &Table) -> Result<()> {
        check_shape(table)?;
        self.writer.write_record(&table.header)?;
        for row in &table.rows {
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        info!(rows = table.len(), "wrote CSV report");
        Ok(())
    }
}

/// Quote an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Writes tables into a SQLite table, replacing its previous contents.
pub struct SqliteSink {
    conn: Connection,
    table_name: String,
}

impl SqliteSink {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>, table_name: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
            table_name: table_name.to_string(),
        })
    }

    /// An in-memory database.
    pub fn in_memory(table_name: &str) -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            table_name: table_name.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ReportSink for SqliteSink {
    fn write_table(&mut self, table: &Table) -> Result<()> {
        check_shape(table)?;
        let name = quote_ident(&self.table_name);
        let columns: Vec<String> = table
            .header
            .iter()
            .zip(&table.kinds)
            .map(|(h, k)| format!("{} {}", quote_ident(h), k.sql_type()))
            .collect();
        let placeholders = vec!["?"; table.header.len()].join(", ");

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", name), [])?;
        tx.execute(
            &format!("CREATE TABLE {} ({})", name, columns.join(", ")),
            [],
        )?;
        {
            let mut stmt =
                tx.prepare(&format!("INSERT INTO {} VALUES ({})", name, placeholders))?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        info!(table = %self.table_name, rows = table.len(), "wrote SQLite report");
        Ok(())
    }
}
