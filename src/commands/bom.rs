//! BOM commands - check, reduce and add stock, find the buildable count.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, style::Style, Alignment, Modify},
    Table, Tabled,
};

use super::{confirm, Session};
use crate::bom::{validate_multiplier, Adjustment, CheckReport, LineStatus, Reconciler};
use crate::sheet::Worksheet;

fn open(path: &Path) -> Result<Reconciler<Worksheet>> {
    Reconciler::open(path).with_context(|| format!("Failed to load BOM: {}", path.display()))
}

impl LineStatus {
    fn symbol(&self) -> colored::ColoredString {
        match self {
            LineStatus::Sufficient { .. } => "■".green(),
            LineStatus::LowStock { .. } => "■".yellow(),
            LineStatus::NoStock { .. } => "■".red(),
            LineStatus::Missing => "■".dimmed(),
        }
    }

    fn required(&self) -> Option<i64> {
        match *self {
            LineStatus::Missing => None,
            LineStatus::NoStock { required }
            | LineStatus::LowStock { required, .. }
            | LineStatus::Sufficient { required } => Some(required),
        }
    }
}

/// Table row for check results.
#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "")]
    indicator: String,
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Stock No")]
    stock_no: String,
    #[tabled(rename = "Designator")]
    designator: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "On hand")]
    on_hand: String,
}

fn print_report(report: &CheckReport) {
    if report.lines.is_empty() {
        println!("{} No BOM lines found", "✗".red());
        return;
    }

    let dash = || "—".to_string();
    let rows: Vec<CheckRow> = report
        .lines
        .iter()
        .map(|l| CheckRow {
            indicator: l.status.symbol().to_string(),
            row: l.line.row,
            stock_no: l.line.stock_no.clone(),
            designator: l.line.designator.clone(),
            package: l.package.clone().unwrap_or_else(dash),
            required: l.status.required().map(|r| r.to_string()).unwrap_or_else(dash),
            on_hand: l.on_hand.map(|q| q.to_string()).unwrap_or_else(dash),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(5..=6)).with(Alignment::right()))
        .to_string();

    println!("\n{}", table);
    println!(
        "{} Sufficient  {} Low Stock  {} No Stock  {} Missing",
        "■".green(),
        "■".yellow(),
        "■".red(),
        "■".dimmed()
    );

    let messages: Vec<String> = report.shortages().filter_map(|l| l.message()).collect();
    if !messages.is_empty() {
        println!();
        for message in &messages {
            println!("{} {}", "!".yellow().bold(), message);
        }
    }

    println!();
    println!(
        "{} {} line(s), {} matched, {} short (BOM count {})",
        "Summary:".bold(),
        report.lines.len(),
        report.matched_count(),
        messages.len(),
        report.multiplier
    );
    if report.has_enough_stock() {
        println!("{} Has enough stock.", "✓".green());
    }
}

/// Execute the BOM check command.
pub fn execute_check(session: &Session, bom_path: &Path, count: u32, json: bool) -> Result<()> {
    validate_multiplier(count)?;
    let reconciler = open(bom_path)?;
    let report = reconciler.check(&session.registry, count)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Execute BOM reduce or add.
///
/// The check is printed first; stock is changed only after it passes and
/// the user confirms.
pub fn execute_adjust(
    session: &mut Session,
    bom_path: &Path,
    count: u32,
    action: Adjustment,
    yes: bool,
) -> Result<()> {
    validate_multiplier(count)?;
    let reconciler = open(bom_path)?;

    let report = reconciler.check(&session.registry, count)?;
    print_report(&report);

    let allowed = match action {
        Adjustment::Reduce => report.can_reduce(),
        Adjustment::Add => report.can_add(),
    };
    if !allowed {
        println!("\n{} Cannot {} the BOM list", "✗".red(), action.to_string().to_uppercase());
    }

    let prompt = format!("Do you want to {} the BOM list?", action.to_string().to_uppercase());
    if allowed && !confirm(&prompt, yes)? {
        println!("Cancelled");
        return Ok(());
    }

    // Fails with `Blocked` when the check above did not pass
    let result = match action {
        Adjustment::Reduce => reconciler.reduce(&mut session.registry, count)?,
        Adjustment::Add => reconciler.add(&mut session.registry, count)?,
    };
    session.save()?;
    tracing::info!(%action, count, changed = result.changes.len(), "BOM applied to stock");

    println!();
    for change in &result.changes {
        let delta = if change.delta < 0 {
            change.delta.to_string().red()
        } else {
            format!("+{}", change.delta).green()
        };
        println!(
            "  {} / {}: {} → {}",
            change.stock_no, change.package, delta, change.quantity
        );
    }
    for line in &result.skipped {
        println!(
            "  {} {} skipped: no stock record",
            "!".yellow(),
            line.stock_no
        );
    }
    println!(
        "{} {} done: {} stock record(s) updated",
        "✓".green(),
        action,
        result.changes.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct MaxJson<'a> {
    max: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<&'a CheckReport>,
}

/// Execute the maximum buildable count search.
pub fn execute_max(session: &Session, bom_path: &Path, json: bool) -> Result<()> {
    let reconciler = open(bom_path)?;
    let max = reconciler.max_buildable(&session.registry);

    let report = if max > 0 {
        Some(reconciler.check(&session.registry, max)?)
    } else {
        None
    };

    if json {
        let out = MaxJson {
            max,
            check: report.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match report {
        Some(report) => {
            print_report(&report);
            println!("\n{} Maximum BOM count: {}", "■".green(), max.to_string().bold());
        }
        None => {
            let single = reconciler.check(&session.registry, 1)?;
            print_report(&single);
            println!("\n{} Not enough stock for a single build", "✗".red());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataDir;
    use crate::model::Component;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Session) {
        let temp_dir = TempDir::new().unwrap();
        let mut s = Session::open(DataDir::resolve(Some(temp_dir.path().to_path_buf()))).unwrap();
        s.registry.add_package("0603").unwrap();
        s.registry.add_component(Component::new("R1")).unwrap();
        s.registry.set_stock("R1", "0603", 100).unwrap();
        s.save().unwrap();

        fs::write(
            temp_dir.path().join("bom.csv"),
            "Stock No,Qty,Designator\nR1,3,R1\n",
        )
        .unwrap();
        (temp_dir, s)
    }

    fn reload(temp_dir: &TempDir) -> Session {
        Session::open(DataDir::resolve(Some(temp_dir.path().to_path_buf()))).unwrap()
    }

    #[test]
    fn test_zero_count_is_rejected_before_reading() {
        let (temp_dir, s) = setup();
        let err = execute_check(&s, &temp_dir.path().join("absent.csv"), 0, false).unwrap_err();
        assert!(err.to_string().contains("BOM Count does not exist"));
    }

    #[test]
    fn test_reduce_and_add_persist() {
        let (temp_dir, mut s) = setup();
        let bom = temp_dir.path().join("bom.csv");

        execute_adjust(&mut s, &bom, 30, Adjustment::Reduce, true).unwrap();
        let reloaded = reload(&temp_dir);
        assert_eq!(reloaded.registry.find_component("R1").unwrap().total_stock, 10);

        execute_adjust(&mut s, &bom, 30, Adjustment::Add, true).unwrap();
        let reloaded = reload(&temp_dir);
        assert_eq!(reloaded.registry.find_component("R1").unwrap().total_stock, 100);
    }

    #[test]
    fn test_blocked_reduce_leaves_stock() {
        let (temp_dir, mut s) = setup();
        let bom = temp_dir.path().join("bom.csv");

        assert!(execute_adjust(&mut s, &bom, 40, Adjustment::Reduce, true).is_err());
        let reloaded = reload(&temp_dir);
        assert_eq!(reloaded.registry.find_component("R1").unwrap().total_stock, 100);
    }

    #[test]
    fn test_max_runs() {
        let (temp_dir, s) = setup();
        execute_max(&s, &temp_dir.path().join("bom.csv"), true).unwrap();
    }
}
