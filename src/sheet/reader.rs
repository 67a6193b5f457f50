//! Spreadsheet and CSV readers.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::SheetError;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// XLSX/XLSM/XLS/ODS
    Workbook,
    Csv,
}

impl SheetFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self, SheetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "csv" => Ok(Self::Csv),
            _ => Err(SheetError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub(super) fn read_rows(path: &Path, format: SheetFormat) -> Result<Vec<Vec<String>>, SheetError> {
    match format {
        SheetFormat::Workbook => read_workbook(path),
        SheetFormat::Csv => read_csv(path),
    }
}

/// Read the first worksheet of a workbook.
///
/// calamine trims leading empty rows and columns off a range, so cells are
/// placed back at their absolute positions.
fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let display = path.display().to_string();

    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::Open {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet {
            path: display.clone(),
        })?
        .map_err(|e| SheetError::Read {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Ok(Vec::new()),
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let display = path.display().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SheetError::Open {
            path: display.clone(),
            message: e.to_string(),
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::Read {
            path: display.clone(),
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{TabularSource, Worksheet};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(SheetFormat::from_path(Path::new("bom.XLSX")).unwrap(), SheetFormat::Workbook);
        assert_eq!(SheetFormat::from_path(Path::new("bom.xls")).unwrap(), SheetFormat::Workbook);
        assert_eq!(SheetFormat::from_path(Path::new("place.csv")).unwrap(), SheetFormat::Csv);
        assert!(SheetFormat::from_path(Path::new("bom.txt")).is_err());
        assert!(SheetFormat::from_path(Path::new("bom")).is_err());
    }

    #[test]
    fn test_open_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bom.csv");
        fs::write(&path, "Stock,Qty,Designator\nR1,3,\"R1, R2\"\nC1,1\n").unwrap();

        let sheet = Worksheet::open(&path).unwrap();
        assert_eq!(sheet.cell(2, 1), "R1");
        assert_eq!(sheet.cell(2, 3), "R1, R2");
        assert_eq!(sheet.cell(3, 2), "1");
        assert_eq!(sheet.cell(3, 3), "");
    }

    #[test]
    fn test_open_missing_workbook_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = Worksheet::open(&temp_dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, SheetError::Open { .. }));
    }
}
