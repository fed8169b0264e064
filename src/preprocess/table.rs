//! In-memory CSV table. Rows stay as strings until preprocessing; the
//! detection pipeline appends verdict columns and writes the result back out.

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::path::Path;

/// A parsed CSV file: one header row plus zero or more data rows, all cells
/// kept as raw strings.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Parse CSV from any reader. The first row is taken as the header;
    /// a table with no data rows is rejected up front.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(Error::DataFormat("no data rows".to_string()));
        }

        Ok(Self { headers, rows })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Build a table directly from headers and rows.
    pub fn from_records(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::DataFormat("no data rows".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(Error::DataFormat(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, index: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r[index].as_str()).collect()
    }

    /// Append a new column on the right. The value count must match the
    /// row count exactly.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::DataFormat(format!(
                "column {} has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}
