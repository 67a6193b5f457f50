//! BOM sheet rows.

use serde::Serialize;

use crate::sheet::{TabularSource, FIRST_DATA_ROW, MAX_ROW};

const COL_STOCK_NO: usize = 1;
const COL_QUANTITY: usize = 2;
const COL_DESIGNATOR: usize = 3;

/// One row of a BOM sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BomLine {
    /// Spreadsheet row number
    pub row: usize,
    /// Stock number, matched against component names
    pub stock_no: String,
    /// Quantity per unit
    pub quantity: i64,
    /// Designator text as written in the sheet
    pub designator: String,
}

impl BomLine {
    /// Quantity needed for `multiplier` units, saturating at the `i64` range.
    pub fn required(&self, multiplier: u32) -> i64 {
        self.quantity.saturating_mul(i64::from(multiplier))
    }

    fn is_end_marker(&self) -> bool {
        self.stock_no.is_empty() && self.quantity == 0 && self.designator.is_empty()
    }
}

/// Parse a quantity cell.
///
/// Decimal values are truncated and anything unparseable counts as zero.
pub fn parse_quantity(text: &str) -> i64 {
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return n;
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

/// Read BOM lines from row 2 until an all-empty row or the row cap.
pub fn read_lines<S: TabularSource + ?Sized>(source: &S) -> Vec<BomLine> {
    let mut lines = Vec::new();

    for row in FIRST_DATA_ROW..=MAX_ROW {
        let line = BomLine {
            row,
            stock_no: source.cell(row, COL_STOCK_NO),
            quantity: parse_quantity(&source.cell(row, COL_QUANTITY)),
            designator: source.cell(row, COL_DESIGNATOR),
        };
        if line.is_end_marker() {
            break;
        }
        lines.push(line);
    }

    lines
}
