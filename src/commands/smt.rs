//! SMT command - generate a placement program for the pick-and-place machine.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use super::Session;
use crate::smt::SmtJob;

/// Arguments of `smt generate`.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub pcb_name: String,
    pub placement: PathBuf,
    pub bom: Option<PathBuf>,
    pub skip_bom: bool,
    pub profiles: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Execute the generate command.
///
/// The output file is written only after the whole program has been built.
pub fn execute_generate(session: &Session, args: GenerateArgs) -> Result<()> {
    let skip_bom = args.skip_bom || (args.bom.is_none() && session.settings.skip_bom);
    let bom_path = match (skip_bom, args.bom) {
        (true, _) => None,
        (false, Some(path)) => Some(path),
        (false, None) => bail!("A BOM file is required (pass --bom or --skip-bom)"),
    };

    let profile_dir = args
        .profiles
        .unwrap_or_else(|| session.data_dir.profile_dir(&session.settings));
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.txt", args.pcb_name.trim())));

    let job = SmtJob {
        pcb_name: args.pcb_name,
        placement_path: args.placement,
        bom_path,
        profile_dir,
    };
    tracing::debug!(?job, "generating placement program");

    let generated = job.run()?;
    fs::write(&output, &generated.content)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;
    tracing::info!(output = %output.display(), placements = generated.placements, "placement program written");

    println!(
        "{} Generated {} ({} placements, {} profiles)",
        "✓".green(),
        output.display().to_string().bold(),
        generated.placements,
        generated.profiles.len()
    );
    for (slot, part_ref) in generated.profiles.iter().enumerate() {
        println!("  {:>3}  {}", slot, part_ref);
    }
    Ok(())
}
