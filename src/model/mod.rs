//! Inventory domain records.
//!
//! Every entity is identified by its name. Components refer to containers,
//! labels and manufacturers by name through optional fields, so removing one
//! of those entities only has to clear the field.

mod datasheet;
mod label;

use serde::{Deserialize, Serialize};

pub use datasheet::{Datasheet, DatasheetKind};
pub use label::Label;

/// Package list used to seed a fresh registry.
const DEFAULT_PACKAGE_NAMES: &[&str] = &[
    "0201", "0402", "0603", "0805", "1206", "1210", "2512", "SOD-123", "SOD-323", "SOT-23",
    "SOT-223", "SOT-363", "SOIC-8", "SOIC-16", "TSSOP-20", "QFN-32", "LQFP-48", "LQFP-64",
    "DIP-8", "TO-220",
];

/// A physical package (footprint) a component can be stocked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Default package names offered by `co init`.
    pub fn default_names() -> Vec<String> {
        DEFAULT_PACKAGE_NAMES.iter().map(|s| s.to_string()).collect()
    }
}

/// A storage container (drawer, reel rack, box, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A component manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub name: String,
}

impl Manufacturer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// On-hand quantity of one component in one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Package name
    pub package: String,
    /// Quantity on hand (goes negative if a BOM is reduced past zero)
    pub quantity: i64,
}

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Stock number, unique within the registry
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_label: Option<String>,
    /// Leaf of `primary_label`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Per-package stock records, at most one per package
    #[serde(default)]
    pub stocks: Vec<Stock>,
    /// Sum of all stock quantities
    #[serde(default)]
    pub total_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasheet: Option<Datasheet>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            container: None,
            primary_label: None,
            secondary_label: None,
            manufacturer: None,
            stocks: Vec::new(),
            total_stock: 0,
            datasheet: None,
        }
    }

    /// Stock record for a package, if the component uses it.
    pub fn stock(&self, package: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.package == package)
    }

    pub fn stock_mut(&mut self, package: &str) -> Option<&mut Stock> {
        self.stocks.iter_mut().find(|s| s.package == package)
    }

    /// Set the quantity for a package, creating the record if needed.
    ///
    /// The total is adjusted by the difference to the previous quantity.
    pub fn set_stock(&mut self, package: &str, quantity: i64) {
        let previous = match self.stock_mut(package) {
            Some(stock) => std::mem::replace(&mut stock.quantity, quantity),
            None => {
                self.stocks.push(Stock {
                    package: package.to_string(),
                    quantity,
                });
                0
            }
        };
        self.total_stock = self
            .total_stock
            .saturating_add(quantity.saturating_sub(previous));
    }

    /// Drop the record for a package and return its quantity.
    pub fn remove_stock(&mut self, package: &str) -> Option<i64> {
        let index = self.stocks.iter().position(|s| s.package == package)?;
        let removed = self.stocks.remove(index);
        self.total_stock = self.total_stock.saturating_sub(removed.quantity);
        Some(removed.quantity)
    }

    /// Add `delta` to a package record and to the total, saturating at the
    /// `i64` range.
    pub fn adjust_stock(&mut self, package: &str, delta: i64) -> bool {
        match self.stock_mut(package) {
            Some(stock) => {
                stock.quantity = stock.quantity.saturating_add(delta);
                self.total_stock = self.total_stock.saturating_add(delta);
                true
            }
            None => false,
        }
    }
}
