//! Inventory commands: containers, packages, manufacturers, labels and
//! components.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment, Modify},
    Table, Tabled,
};

use super::{confirm, Session};
use crate::model::{Component, Datasheet, DatasheetKind, Package};
use crate::registry::{EntityKind, Registry};

/// Name-only entity classes that share the add/remove/list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Container,
    Package,
    Manufacturer,
}

impl Catalog {
    fn kind(self) -> EntityKind {
        match self {
            Catalog::Container => EntityKind::Container,
            Catalog::Package => EntityKind::Package,
            Catalog::Manufacturer => EntityKind::Manufacturer,
        }
    }

    fn names(self, registry: &Registry) -> Vec<String> {
        match self {
            Catalog::Container => registry.container_names(),
            Catalog::Package => registry.package_names(),
            Catalog::Manufacturer => registry.manufacturer_names(),
        }
    }

    fn usage(self, registry: &Registry, name: &str) -> usize {
        match self {
            Catalog::Container => registry.container_usage(name),
            Catalog::Package => registry.package_usage(name),
            Catalog::Manufacturer => registry.manufacturer_usage(name),
        }
    }
}

/// Seed an empty registry with the default package list.
pub fn execute_init(session: &mut Session) -> Result<()> {
    let profile_dir = session.data_dir.profile_dir(&session.settings);
    std::fs::create_dir_all(&profile_dir)
        .with_context(|| format!("Failed to create profile directory: {}", profile_dir.display()))?;

    let mut added = 0;
    if session.registry.packages().is_empty() {
        for name in Package::default_names() {
            session.registry.add_package(&name)?;
            added += 1;
        }
    }
    session.save()?;

    println!(
        "{} Data directory ready at {}",
        "✓".green(),
        session.data_dir.root().display()
    );
    if added > 0 {
        println!("  Added {} default packages", added);
    }
    println!("  Profiles: {}", profile_dir.display());
    Ok(())
}

pub fn execute_add(session: &mut Session, catalog: Catalog, name: &str) -> Result<()> {
    let name = name.trim();
    match catalog {
        Catalog::Container => session.registry.add_container(name)?,
        Catalog::Package => session.registry.add_package(name)?,
        Catalog::Manufacturer => session.registry.add_manufacturer(name)?,
    }
    session.save()?;
    tracing::info!(kind = %catalog.kind(), name, "added");
    println!("{} Added {} {}", "✓".green(), catalog.kind(), name.bold());
    Ok(())
}

pub fn execute_remove(session: &mut Session, catalog: Catalog, name: &str, yes: bool) -> Result<()> {
    // Manufacturer lookup ignores case, so remove by the stored spelling
    let name = match catalog {
        Catalog::Manufacturer => session
            .registry
            .find_manufacturer(name)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| name.to_string()),
        _ => name.to_string(),
    };

    let usage = catalog.usage(&session.registry, &name);
    if usage > 0 {
        println!("There are {} component(s) using it.", usage);
        if !confirm(&format!("Do you want to remove {} \"{}\"?", catalog.kind(), name), yes)? {
            println!("Cancelled");
            return Ok(());
        }
    }

    let detached = match catalog {
        Catalog::Container => session.registry.remove_container(&name)?,
        Catalog::Package => session.registry.remove_package(&name)?,
        Catalog::Manufacturer => session.registry.remove_manufacturer(&name)?,
    };
    session.save()?;
    tracing::info!(kind = %catalog.kind(), name = %name, detached, "removed");

    println!("{} Removed {} {}", "✓".green(), catalog.kind(), name.bold());
    if detached > 0 {
        println!("  Updated {} component(s)", detached);
    }
    Ok(())
}

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Components")]
    used_by: usize,
}

pub fn execute_list(session: &Session, catalog: Catalog) -> Result<()> {
    let names = catalog.names(&session.registry);
    if names.is_empty() {
        println!("{} No {}s registered", "!".yellow(), catalog.kind().to_string().to_lowercase());
        return Ok(());
    }

    let rows: Vec<NameRow> = names
        .into_iter()
        .map(|name| NameRow {
            used_by: catalog.usage(&session.registry, &name),
            name,
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    Ok(())
}

// ── Labels ───────────────────────────────────────────────────────────────────

pub fn execute_label_add(session: &mut Session, name: &str, parent: Option<&str>) -> Result<()> {
    let name = name.trim();
    match parent {
        Some(parent) => session.registry.add_leaf_label(parent, name)?,
        None => session.registry.add_top_label(name)?,
    }
    session.save()?;
    tracing::info!(name, parent, "label added");

    match parent {
        Some(parent) => println!("{} Added label {} under {}", "✓".green(), name.bold(), parent),
        None => println!("{} Added label {}", "✓".green(), name.bold()),
    }
    Ok(())
}

pub fn execute_label_remove(
    session: &mut Session,
    name: &str,
    parent: Option<&str>,
    yes: bool,
) -> Result<()> {
    let usage = session.registry.label_usage(parent, name);
    if usage > 0 {
        println!("There are {} component(s) using it.", usage);
        if !confirm(&format!("Do you want to remove label \"{}\"?", name), yes)? {
            println!("Cancelled");
            return Ok(());
        }
    }

    let detached = match parent {
        Some(parent) => session.registry.remove_leaf_label(parent, name)?,
        None => session.registry.remove_top_label(name)?,
    };
    session.save()?;
    tracing::info!(name, parent, detached, "label removed");

    println!("{} Removed label {}", "✓".green(), name.bold());
    if detached > 0 {
        println!("  Updated {} component(s)", detached);
    }
    Ok(())
}

pub fn execute_label_list(session: &Session) -> Result<()> {
    let labels = session.registry.top_labels();
    if labels.is_empty() {
        println!("{} No labels registered", "!".yellow());
        return Ok(());
    }

    for label in labels {
        println!(
            "{} {}",
            label.name.bold(),
            format!("({})", session.registry.label_usage(None, &label.name)).dimmed()
        );
        for leaf in &label.leaves {
            println!(
                "  └ {} {}",
                leaf,
                format!("({})", session.registry.label_usage(Some(&label.name), leaf)).dimmed()
            );
        }
    }
    Ok(())
}

// ── Components ───────────────────────────────────────────────────────────────

/// Optional component references given on the command line.
///
/// For `component set`, an empty string clears the field.
#[derive(Debug, Default, Clone)]
pub struct ComponentFields {
    pub container: Option<String>,
    pub manufacturer: Option<String>,
    pub label: Option<String>,
    pub sublabel: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl ComponentFields {
    fn apply(self, registry: &Registry, component: &mut Component) {
        if let Some(container) = self.container {
            component.container = non_empty(container);
        }
        if let Some(manufacturer) = self.manufacturer {
            component.manufacturer = non_empty(manufacturer).map(|m| {
                registry
                    .find_manufacturer(&m)
                    .map(|found| found.name.clone())
                    .unwrap_or(m)
            });
        }
        if let Some(label) = self.label {
            let label = non_empty(label);
            if label != component.primary_label {
                component.secondary_label = None;
            }
            component.primary_label = label;
        }
        if let Some(sublabel) = self.sublabel {
            component.secondary_label = non_empty(sublabel);
        }
    }
}

pub fn execute_component_add(session: &mut Session, name: &str, fields: ComponentFields) -> Result<()> {
    let mut component = Component::new(name.trim());
    fields.apply(&session.registry, &mut component);
    session.registry.add_component(component)?;
    session.save()?;
    tracing::info!(name, "component added");

    println!("{} Added component {}", "✓".green(), name.trim().bold());
    Ok(())
}

pub fn execute_component_remove(session: &mut Session, name: &str) -> Result<()> {
    let removed = session.registry.remove_component(name)?;
    session.save()?;
    tracing::info!(name, total_stock = removed.total_stock, "component removed");

    println!("{} Removed component {}", "✓".green(), name.bold());
    Ok(())
}

pub fn execute_component_set(session: &mut Session, name: &str, fields: ComponentFields) -> Result<()> {
    let registry = session.registry.clone();
    session
        .registry
        .update_component(name, |c| fields.apply(&registry, c))?;
    session.save()?;
    tracing::info!(name, "component updated");

    println!("{} Updated component {}", "✓".green(), name.bold());
    Ok(())
}

pub fn execute_component_stock(
    session: &mut Session,
    name: &str,
    package: &str,
    quantity: i64,
) -> Result<()> {
    session.registry.set_stock(name, package, quantity)?;
    session.save()?;
    tracing::info!(name, package, quantity, "stock set");

    let total = session
        .registry
        .find_component(name)
        .map(|c| c.total_stock)
        .unwrap_or(0);
    println!(
        "{} {} / {}: {} (total {})",
        "✓".green(),
        name.bold(),
        package,
        quantity,
        total
    );
    Ok(())
}

pub fn execute_component_datasheet(
    session: &mut Session,
    name: &str,
    path: Option<PathBuf>,
    kind: DatasheetKind,
) -> Result<()> {
    let datasheet = path.map(|path| Datasheet { path, kind });
    if let Some(ref d) = datasheet {
        if !d.path.exists() {
            println!("{} {} does not exist (stored anyway)", "!".yellow(), d.path.display());
        }
    }
    let cleared = datasheet.is_none();
    session.registry.set_datasheet(name, datasheet)?;
    session.save()?;

    if cleared {
        println!("{} Cleared datasheet of {}", "✓".green(), name.bold());
    } else {
        println!("{} Attached {} to {}", "✓".green(), kind, name.bold());
    }
    Ok(())
}

fn label_path(c: &Component) -> String {
    match (&c.primary_label, &c.secondary_label) {
        (Some(p), Some(s)) => format!("{}/{}", p, s),
        (Some(p), None) => p.clone(),
        _ => "—".to_string(),
    }
}

pub fn execute_component_list(session: &Session) -> Result<()> {
    let components = session.registry.components();
    if components.is_empty() {
        println!("{} No components registered", "!".yellow());
        return Ok(());
    }

    let settings = &session.settings;
    let dash = || "—".to_string();

    let mut builder = Builder::default();
    let mut header = vec!["Name"];
    if settings.show_containers {
        header.push("Container");
    }
    header.extend(["Label", "Manufacturer", "Stock"]);
    builder.push_record(header);

    for c in components {
        let stock = if settings.mark_low_stock && c.total_stock <= 0 {
            c.total_stock.to_string().red().to_string()
        } else {
            c.total_stock.to_string()
        };
        let mut record = vec![c.name.clone()];
        if settings.show_containers {
            record.push(c.container.clone().unwrap_or_else(dash));
        }
        record.push(label_path(c));
        record.push(c.manufacturer.clone().unwrap_or_else(dash));
        record.push(stock);
        builder.push_record(record);
    }

    let stock_column = if settings.show_containers { 4 } else { 3 };
    let table = builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::single(stock_column)).with(Alignment::right()))
        .to_string();
    println!("{}", table);

    let low = components.iter().filter(|c| c.total_stock <= 0).count();
    if settings.mark_low_stock && low > 0 {
        println!("\n{} {} component(s) out of stock", "!".yellow().bold(), low);
    }
    Ok(())
}

pub fn execute_component_show(session: &Session, name: &str) -> Result<()> {
    let Some(c) = session.registry.find_component(name) else {
        bail!("Component \"{}\" does not exist.", name);
    };

    let dash = || "—".to_string();
    println!("{}", c.name.bold());
    println!("  Container:    {}", c.container.clone().unwrap_or_else(dash));
    println!("  Label:        {}", label_path(c));
    println!("  Manufacturer: {}", c.manufacturer.clone().unwrap_or_else(dash));
    match &c.datasheet {
        Some(d) => println!("  {:<13} {}", format!("{}:", d.kind), d.path.display()),
        None => println!("  Datasheet:    —"),
    }

    println!("  Stock:        {}", c.total_stock);
    // Registry order is the order BOM checks pick packages in
    for package in session.registry.packages() {
        if let Some(stock) = c.stock(&package.name) {
            println!("    {:<12} {:>8}", stock.package, stock.quantity);
        }
    }
    Ok(())
}
