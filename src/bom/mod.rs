//! BOM reconciliation against registry stock.
//!
//! A BOM sheet lists (stock number, quantity per unit, designator) in
//! columns 1–3 from row 2 on. Every line is matched by exact name against the
//! registry and compared with the on-hand quantity of the component's first
//! stocked package (in registry package order).
//!
//! The four operations are:
//! - **check**: classify every line as missing, out of stock, low or sufficient
//! - **reduce** / **add**: subtract or add the required quantity, gated by a
//!   passing check
//! - **max_buildable**: the largest build count that checks clean

mod line;

use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::registry::Registry;
use crate::sheet::{SheetError, TabularSource, Worksheet};

pub use line::{read_lines, BomLine};

/// Upper bound for the build count search.
pub const MAX_MULTIPLIER: u32 = 99_999;

/// Stock-changing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Reduce,
    Add,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Reduce => f.write_str("Reduce"),
            Adjustment::Add => f.write_str("Add"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BomError {
    #[error("BOM Count does not exist..")]
    ZeroMultiplier,

    #[error("{action} is blocked: {count} BOM line(s) are missing or short of stock")]
    Blocked { action: Adjustment, count: usize },

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Outcome of matching one BOM line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    /// Stock number not found in the registry
    Missing,
    /// Component found with nothing on hand
    NoStock { required: i64 },
    /// On-hand quantity below the requirement
    LowStock { required: i64, deficit: i64 },
    Sufficient { required: i64 },
}

impl LineStatus {
    pub fn is_shortage(&self) -> bool {
        !matches!(self, LineStatus::Sufficient { .. })
    }
}

/// A checked BOM line.
#[derive(Debug, Clone, Serialize)]
pub struct LineCheck {
    #[serde(flatten)]
    pub line: BomLine,
    /// Package whose stock was compared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_hand: Option<i64>,
    #[serde(flatten)]
    pub status: LineStatus,
}

impl LineCheck {
    /// One-line report in the inventory's message format,
    /// e.g. `Low Stock: R1 => R1(-20)`. `None` for sufficient lines.
    pub fn message(&self) -> Option<String> {
        let l = &self.line;
        match self.status {
            LineStatus::Missing => Some(format!("Missing: {} => {}", l.stock_no, l.designator)),
            LineStatus::NoStock { required } => Some(format!(
                "No Stock: {} => {}(-{})",
                l.stock_no, l.designator, required
            )),
            LineStatus::LowStock { deficit, .. } => Some(format!(
                "Low Stock: {} => {}(-{})",
                l.stock_no, l.designator, deficit
            )),
            LineStatus::Sufficient { .. } => None,
        }
    }
}

/// Result of a check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub multiplier: u32,
    pub lines: Vec<LineCheck>,
}

impl CheckReport {
    /// Lines that are not sufficient.
    pub fn shortages(&self) -> impl Iterator<Item = &LineCheck> {
        self.lines.iter().filter(|l| l.status.is_shortage())
    }

    pub fn matched_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.status != LineStatus::Missing)
            .count()
    }

    /// Reduce needs every line matched and sufficient.
    pub fn can_reduce(&self) -> bool {
        self.shortages().next().is_none()
    }

    /// Add only needs every line matched.
    pub fn can_add(&self) -> bool {
        self.lines.iter().all(|l| l.status != LineStatus::Missing)
    }

    /// At least one matched line and no shortages.
    pub fn has_enough_stock(&self) -> bool {
        self.matched_count() > 0 && self.can_reduce()
    }

    fn blocking_count(&self, action: Adjustment) -> usize {
        match action {
            Adjustment::Reduce => self.shortages().count(),
            Adjustment::Add => self
                .lines
                .iter()
                .filter(|l| l.status == LineStatus::Missing)
                .count(),
        }
    }
}

/// A stock change applied by reduce/add.
#[derive(Debug, Clone, Serialize)]
pub struct StockChange {
    pub stock_no: String,
    pub package: String,
    pub delta: i64,
    /// Quantity in the package after the change
    pub quantity: i64,
}

/// Result of a reduce/add run.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustReport {
    pub action: Adjustment,
    pub multiplier: u32,
    pub changes: Vec<StockChange>,
    /// Lines that matched no stock record and were left alone
    pub skipped: Vec<BomLine>,
}

/// Resolved stock for a BOM line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Missing,
    Found {
        package: Option<String>,
        on_hand: i64,
    },
}

fn resolve(registry: &Registry, line: &BomLine) -> Resolution {
    match registry.find_component(&line.stock_no) {
        None => Resolution::Missing,
        Some(component) => {
            let package = registry.first_stocked_package(component);
            let on_hand = package
                .as_deref()
                .and_then(|p| component.stock(p))
                .map(|s| s.quantity)
                .unwrap_or(0);
            Resolution::Found { package, on_hand }
        }
    }
}

fn classify(resolution: &Resolution, required: i64) -> LineStatus {
    match *resolution {
        Resolution::Missing => LineStatus::Missing,
        Resolution::Found { on_hand, .. } if on_hand == 0 => LineStatus::NoStock { required },
        // A saturated requirement can never be covered
        Resolution::Found { on_hand, .. } if on_hand < required || required == i64::MAX => {
            LineStatus::LowStock {
                required,
                deficit: required.saturating_sub(on_hand).max(1),
            }
        }
        Resolution::Found { .. } => LineStatus::Sufficient { required },
    }
}

/// Reject a zero build count before anything is read.
pub fn validate_multiplier(multiplier: u32) -> Result<(), BomError> {
    if multiplier == 0 {
        Err(BomError::ZeroMultiplier)
    } else {
        Ok(())
    }
}

/// Runs reconciliation operations over one BOM source.
pub struct Reconciler<S> {
    source: S,
}

impl Reconciler<Worksheet> {
    /// Load a BOM spreadsheet from disk.
    pub fn open(path: &Path) -> Result<Self, SheetError> {
        Ok(Self::new(Worksheet::open(path)?))
    }
}

impl<S: TabularSource> Reconciler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Classify every BOM line for `multiplier` builds.
    pub fn check(&self, registry: &Registry, multiplier: u32) -> Result<CheckReport, BomError> {
        validate_multiplier(multiplier)?;
        let lines = read_lines(&self.source);

        let checked = lines
            .into_iter()
            .map(|line| {
                let resolution = resolve(registry, &line);
                let status = classify(&resolution, line.required(multiplier));
                tracing::debug!(row = line.row, stock_no = %line.stock_no, ?status, "checked BOM line");
                let (package, on_hand) = match resolution {
                    Resolution::Missing => (None, None),
                    Resolution::Found { package, on_hand } => (package, Some(on_hand)),
                };
                LineCheck {
                    line,
                    package,
                    on_hand,
                    status,
                }
            })
            .collect();

        Ok(CheckReport {
            multiplier,
            lines: checked,
        })
    }

    /// Subtract the required quantities from stock.
    pub fn reduce(&self, registry: &mut Registry, multiplier: u32) -> Result<AdjustReport, BomError> {
        self.adjust(registry, multiplier, Adjustment::Reduce)
    }

    /// Add the required quantities back to stock.
    pub fn add(&self, registry: &mut Registry, multiplier: u32) -> Result<AdjustReport, BomError> {
        self.adjust(registry, multiplier, Adjustment::Add)
    }

    fn adjust(
        &self,
        registry: &mut Registry,
        multiplier: u32,
        action: Adjustment,
    ) -> Result<AdjustReport, BomError> {
        let report = self.check(registry, multiplier)?;
        let allowed = match action {
            Adjustment::Reduce => report.can_reduce(),
            Adjustment::Add => report.can_add(),
        };
        if !allowed {
            return Err(BomError::Blocked {
                action,
                count: report.blocking_count(action),
            });
        }

        let mut changes = Vec::new();
        let mut skipped = Vec::new();

        for checked in report.lines {
            let required = checked.line.required(multiplier);
            let delta = match action {
                Adjustment::Reduce => required.saturating_neg(),
                Adjustment::Add => required,
            };

            let applied = checked.package.as_deref().and_then(|package| {
                let component = registry.find_component_mut(&checked.line.stock_no)?;
                component.adjust_stock(package, delta).then(|| StockChange {
                    stock_no: checked.line.stock_no.clone(),
                    package: package.to_string(),
                    delta,
                    quantity: component.stock(package).map(|s| s.quantity).unwrap_or(0),
                })
            });

            match applied {
                Some(change) => {
                    tracing::debug!(stock_no = %change.stock_no, delta, "stock adjusted");
                    changes.push(change);
                }
                None => {
                    tracing::warn!(stock_no = %checked.line.stock_no, "no stock record, line skipped");
                    skipped.push(checked.line);
                }
            }
        }

        Ok(AdjustReport {
            action,
            multiplier,
            changes,
            skipped,
        })
    }

    /// Largest build count whose check reports no shortages.
    ///
    /// Counts are tried upwards from 1 and the search stops at the first
    /// count with a shortage, so 0 means a single build is not possible.
    pub fn max_buildable(&self, registry: &Registry) -> u32 {
        let resolved: Vec<(BomLine, Resolution)> = read_lines(&self.source)
            .into_iter()
            .map(|line| {
                let resolution = resolve(registry, &line);
                (line, resolution)
            })
            .collect();

        let mut best = 0;
        for multiplier in 1..=MAX_MULTIPLIER {
            let short = resolved
                .iter()
                .any(|(line, r)| classify(r, line.required(multiplier)).is_shortage());
            if short {
                break;
            }
            best = multiplier;
        }
        tracing::debug!(best, "maximum buildable count");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;
    use crate::sheet::Worksheet;
    use std::cell::Cell;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_package("0603").unwrap();
        reg.add_package("0805").unwrap();
        reg.add_component(Component::new("R1")).unwrap();
        reg.set_stock("R1", "0603", 100).unwrap();
        reg.add_component(Component::new("C1")).unwrap();
        reg.set_stock("C1", "0805", 50).unwrap();
        reg
    }

    fn bom(rows: &[[&str; 3]]) -> Worksheet {
        let mut all = vec![vec!["Stock No".to_string(), "Qty".to_string(), "Designator".to_string()]];
        all.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        Worksheet::from_rows(all)
    }

    /// Counts every cell read.
    struct CountingSource {
        inner: Worksheet,
        reads: Cell<usize>,
    }

    impl TabularSource for CountingSource {
        fn cell(&self, row: usize, col: usize) -> String {
            self.reads.set(self.reads.get() + 1);
            self.inner.cell(row, col)
        }
    }

    #[test]
    fn test_check_sufficient_and_low() {
        let reg = registry();
        let rec = Reconciler::new(bom(&[["R1", "3", "R1"]]));

        let report = rec.check(&reg, 30).unwrap();
        assert_eq!(report.lines[0].status, LineStatus::Sufficient { required: 90 });
        assert!(report.has_enough_stock());

        let report = rec.check(&reg, 40).unwrap();
        assert_eq!(
            report.lines[0].status,
            LineStatus::LowStock { required: 120, deficit: 20 }
        );
        assert_eq!(report.lines[0].message().unwrap(), "Low Stock: R1 => R1(-20)");
        assert!(!report.can_reduce());
        assert!(report.can_add());
    }

    #[test]
    fn test_check_zero_multiplier_reads_nothing() {
        let reg = registry();
        let source = CountingSource {
            inner: bom(&[["R1", "3", "R1"]]),
            reads: Cell::new(0),
        };
        let rec = Reconciler::new(&source);

        let err = rec.check(&reg, 0).unwrap_err();
        assert!(matches!(err, BomError::ZeroMultiplier));
        assert_eq!(err.to_string(), "BOM Count does not exist..");
        assert_eq!(source.reads.get(), 0);
    }

    #[test]
    fn test_check_missing_and_no_stock() {
        let mut reg = registry();
        reg.add_component(Component::new("U1")).unwrap();
        reg.set_stock("U1", "0603", 0).unwrap();
        let rec = Reconciler::new(bom(&[["U1", "1", "U1"], ["X9", "2", "U2"]]));

        let report = rec.check(&reg, 1).unwrap();
        assert_eq!(report.lines[0].status, LineStatus::NoStock { required: 1 });
        assert_eq!(report.lines[0].message().unwrap(), "No Stock: U1 => U1(-1)");
        assert_eq!(report.lines[1].status, LineStatus::Missing);
        assert_eq!(report.lines[1].message().unwrap(), "Missing: X9 => U2");
        assert!(!report.can_add());
        assert!(!report.can_reduce());
        assert!(!report.has_enough_stock());
    }

    #[test]
    fn test_component_without_stock_record_is_no_stock() {
        let mut reg = registry();
        reg.add_component(Component::new("D1")).unwrap();
        let rec = Reconciler::new(bom(&[["D1", "1", "D1"]]));

        let report = rec.check(&reg, 1).unwrap();
        assert_eq!(report.lines[0].status, LineStatus::NoStock { required: 1 });
        assert_eq!(report.lines[0].package, None);
    }

    #[test]
    fn test_first_registered_package_is_compared() {
        let mut reg = registry();
        // 0603 comes first in registry order even though 0805 holds more.
        reg.set_stock("C1", "0603", 1).unwrap();
        let rec = Reconciler::new(bom(&[["C1", "2", "C1"]]));

        let report = rec.check(&reg, 1).unwrap();
        assert_eq!(report.lines[0].package.as_deref(), Some("0603"));
        assert_eq!(
            report.lines[0].status,
            LineStatus::LowStock { required: 2, deficit: 1 }
        );
    }

    #[test]
    fn test_reduce_then_add_restores_stock() {
        let mut reg = registry();
        let original = reg.clone();
        let rec = Reconciler::new(bom(&[["R1", "3", "R1"], ["C1", "2", "C1, C2"]]));

        let reduced = rec.reduce(&mut reg, 10).unwrap();
        assert_eq!(reduced.changes.len(), 2);
        assert_eq!(reg.find_component("R1").unwrap().stock("0603").unwrap().quantity, 70);
        assert_eq!(reg.find_component("R1").unwrap().total_stock, 70);
        assert_eq!(reg.find_component("C1").unwrap().stock("0805").unwrap().quantity, 30);

        rec.add(&mut reg, 10).unwrap();
        assert_eq!(reg, original);
    }

    #[test]
    fn test_reduce_blocked_by_shortage() {
        let mut reg = registry();
        let original = reg.clone();
        let rec = Reconciler::new(bom(&[["R1", "3", "R1"], ["C1", "60", "C1"]]));

        let err = rec.reduce(&mut reg, 1).unwrap_err();
        assert!(matches!(
            err,
            BomError::Blocked { action: Adjustment::Reduce, count: 1 }
        ));
        assert_eq!(reg, original);

        // Add is only blocked by missing components.
        rec.add(&mut reg, 1).unwrap();
        assert_eq!(reg.find_component("C1").unwrap().total_stock, 110);
    }

    #[test]
    fn test_add_blocked_by_missing_component() {
        let mut reg = registry();
        let rec = Reconciler::new(bom(&[["X1", "1", "X1"]]));
        assert!(matches!(
            rec.add(&mut reg, 1),
            Err(BomError::Blocked { action: Adjustment::Add, count: 1 })
        ));
    }

    #[test]
    fn test_add_skips_component_without_stock_record() {
        let mut reg = registry();
        reg.add_component(Component::new("D1")).unwrap();
        let rec = Reconciler::new(bom(&[["D1", "1", "D1"], ["R1", "1", "R1"]]));

        let report = rec.add(&mut reg, 5).unwrap();
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].stock_no, "D1");
        assert_eq!(reg.find_component("R1").unwrap().total_stock, 105);
    }

    #[test]
    fn test_max_buildable_is_boundary() {
        let reg = registry();
        let rec = Reconciler::new(bom(&[["R1", "3", "R1"], ["C1", "2", "C1"]]));

        let max = rec.max_buildable(&reg);
        assert_eq!(max, 25);
        assert!(rec.check(&reg, max).unwrap().can_reduce());
        assert!(!rec.check(&reg, max + 1).unwrap().can_reduce());
    }

    #[test]
    fn test_max_buildable_zero_when_single_build_fails() {
        let reg = registry();
        let rec = Reconciler::new(bom(&[["R1", "101", "R1"]]));
        assert_eq!(rec.max_buildable(&reg), 0);

        let rec = Reconciler::new(bom(&[["X1", "1", "X1"]]));
        assert_eq!(rec.max_buildable(&reg), 0);
    }

    #[test]
    fn test_check_huge_quantity_is_shortage() {
        let reg = registry();
        let rec = Reconciler::new(bom(&[["R1", "1e19", "R1"]]));

        let report = rec.check(&reg, 2).unwrap();
        assert!(matches!(
            report.lines[0].status,
            LineStatus::LowStock {
                required: i64::MAX,
                ..
            }
        ));
        assert!(!report.can_reduce());
    }

    #[test]
    fn test_max_buildable_huge_stock_and_quantity() {
        let mut reg = registry();
        reg.set_stock("R1", "0603", i64::MAX).unwrap();
        let rec = Reconciler::new(bom(&[["R1", "100000000000000", "R1"]]));

        // 100000000000000 * 92234 no longer fits in i64
        assert_eq!(rec.max_buildable(&reg), 92233);
    }

    #[test]
    fn test_max_buildable_capped() {
        let reg = registry();
        let rec = Reconciler::new(bom(&[]));
        assert_eq!(rec.max_buildable(&reg), MAX_MULTIPLIER);
    }
}
