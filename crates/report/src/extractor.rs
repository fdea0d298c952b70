//! CSV-backed row extractor.
//!
//! Reads a raw scrape that was saved to disk. Rows are read as-is, including
//! ragged ones, so the record builder can drop them and count them.

use std::path::{Path, PathBuf};
use tracing::debug;
use turnover_core::{Error, Result};
use turnover_ingestion::{RawTable, RowExtractor};

/// Loads a [`RawTable`] from a delimited text file with a header line.
#[derive(Debug, Clone)]
pub struct CsvRowExtractor {
    path: PathBuf,
    delimiter: u8,
}

impl CsvRowExtractor {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn map_err(&self, err: csv::Error) -> Error {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            kind => Error::extract(format!("{}: {:?}", self.path.display(), kind)),
        }
    }
}

impl RowExtractor for CsvRowExtractor {
    fn extract(&mut self) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.map_err(e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| self.map_err(e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.map_err(e))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        debug!(path = %self.path.display(), columns = headers.len(), rows = rows.len(), "read raw table");
        Ok(RawTable::new(headers, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_ragged_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Instrument,Commodity,Total Value (Lacs)").unwrap();
        writeln!(file, "01 Oct 2025,FUTCOM,GOLD,\"1,234.50\"").unwrap();
        writeln!(file, "01 Oct 2025,FUTCOM").unwrap();

        let table = CsvRowExtractor::new(file.path()).extract().unwrap();

        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][3], "1,234.50");
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn test_tab_delimited() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date\tIndex Options Premium Turnover").unwrap();
        writeln!(file, "01-Oct-2025\t52,301.75").unwrap();

        let table = CsvRowExtractor::new(file.path())
            .with_delimiter(b'\t')
            .extract()
            .unwrap();

        assert_eq!(table.column_index("index options premium turnover"), Some(1));
        assert_eq!(table.rows[0][1], "52,301.75");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CsvRowExtractor::new("/nonexistent/raw.csv").extract().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
