//! Tabular data sources.
//!
//! BOM and placement files are read through [`TabularSource`], addressed
//! 1-based by (row, column) like a spreadsheet. Files are loaded completely
//! into a [`Worksheet`] and the file handle is released before any processing
//! starts.

mod reader;

use std::path::Path;

use thiserror::Error;

pub use reader::SheetFormat;

/// Highest row scanned in any input sheet.
pub const MAX_ROW: usize = 999;

/// First data row; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    #[error("{path} contains no worksheet")]
    NoWorksheet { path: String },

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },
}

/// Cell-level read access to a table.
pub trait TabularSource {
    /// Text of the cell at 1-based `(row, col)`; empty when the cell is
    /// blank or outside the table.
    fn cell(&self, row: usize, col: usize) -> String;
}

/// A fully loaded table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worksheet {
    rows: Vec<Vec<String>>,
}

impl Worksheet {
    /// Build a sheet from rows; `rows[0]` is spreadsheet row 1.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Load the first worksheet of a spreadsheet or a CSV file.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        let format = SheetFormat::from_path(path)?;
        let rows = reader::read_rows(path, format)?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "sheet loaded");
        Ok(Self::from_rows(rows))
    }

    #[cfg(test)]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Store a value at 1-based `(row, col)`, growing the table as needed.
    #[cfg(test)]
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if row == 0 || col == 0 {
            return;
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < col {
            cells.resize_with(col, String::new);
        }
        cells[col - 1] = value.into();
    }
}

impl TabularSource for Worksheet {
    fn cell(&self, row: usize, col: usize) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .map(|s| s.trim_end_matches(['\r', '\n']).to_string())
            .unwrap_or_default()
    }
}

impl<T: TabularSource + ?Sized> TabularSource for &T {
    fn cell(&self, row: usize, col: usize) -> String {
        (**self).cell(row, col)
    }
}
