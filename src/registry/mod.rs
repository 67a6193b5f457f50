//! Central registry of all inventory entities.
//!
//! Every entity class is keyed by name. Adding checks for an empty or
//! duplicate name first; removing a referenced entity clears the reference on
//! every component that used it instead of deleting the component.

pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Component, Container, Datasheet, Label, Manufacturer, Package};

/// Entity classes held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Component,
    Package,
    Container,
    Manufacturer,
    Label,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Component => "Component",
            EntityKind::Package => "Package",
            EntityKind::Container => "Container",
            EntityKind::Manufacturer => "Manufacturer",
            EntityKind::Label => "Label",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{0} name must not be empty")]
    EmptyName(EntityKind),

    #[error("{kind} \"{name}\" already exists.")]
    Duplicate { kind: EntityKind, name: String },

    #[error("{kind} \"{name}\" does not exist.")]
    NotFound { kind: EntityKind, name: String },

    #[error("Label \"{leaf}\" is not a secondary label of \"{parent}\".")]
    NotALeaf { parent: String, leaf: String },

    #[error("A secondary label requires a primary label.")]
    SecondaryWithoutPrimary,
}

type Result<T> = std::result::Result<T, RegistryError>;

/// All inventory entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    packages: Vec<Package>,
    #[serde(default)]
    containers: Vec<Container>,
    #[serde(default)]
    manufacturers: Vec<Manufacturer>,
    /// Top-level labels, each owning its leaves
    #[serde(default)]
    labels: Vec<Label>,
}

fn check_name(kind: EntityKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        Err(RegistryError::EmptyName(kind))
    } else {
        Ok(())
    }
}

fn not_found(kind: EntityKind, name: &str) -> RegistryError {
    RegistryError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn duplicate(kind: EntityKind, name: &str) -> RegistryError {
    RegistryError::Duplicate {
        kind,
        name: name.to_string(),
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Listing ──────────────────────────────────────────────────────────────

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn top_labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn package_names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.containers.iter().map(|c| c.name.clone()).collect()
    }

    /// Manufacturer names, sorted case-insensitively.
    pub fn manufacturer_names(&self) -> Vec<String> {
        self.manufacturers.iter().map(|m| m.name.clone()).collect()
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    pub fn find_component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn find_component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn find_container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Case-insensitive manufacturer lookup.
    pub fn find_manufacturer(&self, name: &str) -> Option<&Manufacturer> {
        self.manufacturers
            .iter()
            .find(|m| m.name.to_lowercase() == name.to_lowercase())
    }

    pub fn find_top_label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.name == name)
    }

    fn find_top_label_mut(&mut self, name: &str) -> Option<&mut Label> {
        self.labels.iter_mut().find(|l| l.name == name)
    }

    /// Whether any label, top-level or leaf, carries this name.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name || l.has_leaf(name))
    }

    /// Name of the first registered package the component has a stock
    /// record for.
    ///
    /// Packages are visited in registry order; the component's other stock
    /// records are not considered.
    pub fn first_stocked_package(&self, component: &Component) -> Option<String> {
        self.packages
            .iter()
            .find(|p| component.stock(&p.name).is_some())
            .map(|p| p.name.clone())
    }

    // ── Usage counts ─────────────────────────────────────────────────────────

    pub fn container_usage(&self, name: &str) -> usize {
        self.components
            .iter()
            .filter(|c| c.container.as_deref() == Some(name))
            .count()
    }

    pub fn package_usage(&self, name: &str) -> usize {
        self.components
            .iter()
            .filter(|c| c.stock(name).is_some())
            .count()
    }

    pub fn manufacturer_usage(&self, name: &str) -> usize {
        self.components
            .iter()
            .filter(|c| c.manufacturer.as_deref() == Some(name))
            .count()
    }

    /// Components using a top label (`parent` = None) or a leaf label.
    pub fn label_usage(&self, parent: Option<&str>, name: &str) -> usize {
        self.components
            .iter()
            .filter(|c| match parent {
                None => c.primary_label.as_deref() == Some(name),
                Some(p) => {
                    c.primary_label.as_deref() == Some(p)
                        && c.secondary_label.as_deref() == Some(name)
                }
            })
            .count()
    }

    // ── Containers ───────────────────────────────────────────────────────────

    pub fn add_container(&mut self, name: &str) -> Result<()> {
        check_name(EntityKind::Container, name)?;
        if self.find_container(name).is_some() {
            return Err(duplicate(EntityKind::Container, name));
        }
        self.containers.push(Container::new(name));
        Ok(())
    }

    /// Remove a container and detach it from its components.
    ///
    /// Returns the number of components that were detached.
    pub fn remove_container(&mut self, name: &str) -> Result<usize> {
        let index = self
            .containers
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| not_found(EntityKind::Container, name))?;
        self.containers.remove(index);

        let mut detached = 0;
        for c in self.components.iter_mut() {
            if c.container.as_deref() == Some(name) {
                c.container = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    // ── Packages ─────────────────────────────────────────────────────────────

    pub fn add_package(&mut self, name: &str) -> Result<()> {
        check_name(EntityKind::Package, name)?;
        if self.find_package(name).is_some() {
            return Err(duplicate(EntityKind::Package, name));
        }
        self.packages.push(Package::new(name));
        Ok(())
    }

    /// Remove a package along with every component's stock record for it.
    pub fn remove_package(&mut self, name: &str) -> Result<usize> {
        let index = self
            .packages
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| not_found(EntityKind::Package, name))?;
        self.packages.remove(index);

        let affected = self
            .components
            .iter_mut()
            .filter_map(|c| c.remove_stock(name))
            .count();
        Ok(affected)
    }

    // ── Manufacturers ────────────────────────────────────────────────────────

    /// Add a manufacturer; names are compared case-insensitively.
    pub fn add_manufacturer(&mut self, name: &str) -> Result<()> {
        check_name(EntityKind::Manufacturer, name)?;
        if self.find_manufacturer(name).is_some() {
            return Err(duplicate(EntityKind::Manufacturer, name));
        }
        self.manufacturers.push(Manufacturer::new(name));
        self.manufacturers
            .sort_by_key(|m| m.name.to_lowercase());
        Ok(())
    }

    pub fn remove_manufacturer(&mut self, name: &str) -> Result<usize> {
        let index = self
            .manufacturers
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| not_found(EntityKind::Manufacturer, name))?;
        self.manufacturers.remove(index);

        let mut detached = 0;
        for c in self.components.iter_mut() {
            if c.manufacturer.as_deref() == Some(name) {
                c.manufacturer = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    // ── Labels ───────────────────────────────────────────────────────────────

    /// Add a top-level label. The name must not be used by any other label.
    pub fn add_top_label(&mut self, name: &str) -> Result<()> {
        check_name(EntityKind::Label, name)?;
        if self.has_label(name) {
            return Err(duplicate(EntityKind::Label, name));
        }
        self.labels.push(Label::new(name));
        Ok(())
    }

    /// Add a leaf label under `parent`. The name must be unique within it.
    pub fn add_leaf_label(&mut self, parent: &str, name: &str) -> Result<()> {
        check_name(EntityKind::Label, name)?;
        let top = self
            .find_top_label_mut(parent)
            .ok_or_else(|| not_found(EntityKind::Label, parent))?;
        if top.has_leaf(name) {
            return Err(duplicate(EntityKind::Label, name));
        }
        top.add_leaf(name);
        Ok(())
    }

    /// Remove a top label and all its leaves.
    ///
    /// Components using it lose both their primary and secondary label.
    pub fn remove_top_label(&mut self, name: &str) -> Result<usize> {
        let index = self
            .labels
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| not_found(EntityKind::Label, name))?;
        self.labels.remove(index);

        let mut detached = 0;
        for c in self.components.iter_mut() {
            if c.primary_label.as_deref() == Some(name) {
                c.primary_label = None;
                c.secondary_label = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    pub fn remove_leaf_label(&mut self, parent: &str, name: &str) -> Result<usize> {
        let top = self
            .find_top_label_mut(parent)
            .ok_or_else(|| not_found(EntityKind::Label, parent))?;
        if !top.remove_leaf(name) {
            return Err(RegistryError::NotALeaf {
                parent: parent.to_string(),
                leaf: name.to_string(),
            });
        }

        let mut detached = 0;
        for c in self.components.iter_mut() {
            if c.primary_label.as_deref() == Some(parent)
                && c.secondary_label.as_deref() == Some(name)
            {
                c.secondary_label = None;
                detached += 1;
            }
        }
        Ok(detached)
    }

    // ── Components ───────────────────────────────────────────────────────────

    /// Add a component after validating its name and every reference it
    /// carries.
    pub fn add_component(&mut self, component: Component) -> Result<()> {
        check_name(EntityKind::Component, &component.name)?;
        if self.find_component(&component.name).is_some() {
            return Err(duplicate(EntityKind::Component, &component.name));
        }
        self.check_references(&component)?;
        self.components.push(component);
        Ok(())
    }

    pub fn remove_component(&mut self, name: &str) -> Result<Component> {
        let index = self
            .components
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| not_found(EntityKind::Component, name))?;
        Ok(self.components.remove(index))
    }

    /// Replace a component's references, validating them first.
    pub fn update_component<F>(&mut self, name: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut Component),
    {
        let mut updated = self
            .find_component(name)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Component, name))?;
        update(&mut updated);
        updated.name = name.to_string();
        self.check_references(&updated)?;

        if let Some(slot) = self.find_component_mut(name) {
            *slot = updated;
        }
        Ok(())
    }

    /// Set the on-hand quantity of a component in a registered package.
    pub fn set_stock(&mut self, component: &str, package: &str, quantity: i64) -> Result<()> {
        if self.find_package(package).is_none() {
            return Err(not_found(EntityKind::Package, package));
        }
        let c = self
            .find_component_mut(component)
            .ok_or_else(|| not_found(EntityKind::Component, component))?;
        c.set_stock(package, quantity);
        Ok(())
    }

    pub fn set_datasheet(&mut self, component: &str, datasheet: Option<Datasheet>) -> Result<()> {
        let c = self
            .find_component_mut(component)
            .ok_or_else(|| not_found(EntityKind::Component, component))?;
        c.datasheet = datasheet;
        Ok(())
    }

    fn check_references(&self, c: &Component) -> Result<()> {
        if let Some(ref name) = c.container {
            if self.find_container(name).is_none() {
                return Err(not_found(EntityKind::Container, name));
            }
        }
        if let Some(ref name) = c.manufacturer {
            if !self.manufacturers.iter().any(|m| &m.name == name) {
                return Err(not_found(EntityKind::Manufacturer, name));
            }
        }
        match (&c.primary_label, &c.secondary_label) {
            (None, Some(_)) => return Err(RegistryError::SecondaryWithoutPrimary),
            (Some(primary), secondary) => {
                let top = self
                    .find_top_label(primary)
                    .ok_or_else(|| not_found(EntityKind::Label, primary))?;
                if let Some(leaf) = secondary {
                    if !top.has_leaf(leaf) {
                        return Err(RegistryError::NotALeaf {
                            parent: primary.clone(),
                            leaf: leaf.clone(),
                        });
                    }
                }
            }
            (None, None) => {}
        }
        for stock in &c.stocks {
            if self.find_package(&stock.package).is_none() {
                return Err(not_found(EntityKind::Package, &stock.package));
            }
        }
        Ok(())
    }
}
