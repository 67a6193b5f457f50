//! SMT placement file generation.
//!
//! Builds a pick-and-place program for the placement machine from:
//! - the board template (`board_temp.txt`) in the profile directory
//! - a placement sheet: X, Y, rotation, designator (and part reference when
//!   BOM correlation is skipped)
//! - optionally a BOM sheet mapping part references to designator lists
//! - one profile file per distinct part reference
//!
//! The output is assembled completely in memory; nothing is written unless
//! every row formats and every lookup succeeds.

mod format;
mod profile;
mod template;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sheet::{SheetError, TabularSource, Worksheet, FIRST_DATA_ROW, MAX_ROW};

use format::Record;
use profile::{Profile, ProfileLibrary};

/// Template placeholder that must be replaced by a real board name.
pub const PLACEHOLDER_PCB_NAME: &str = "GTMxxx01";

/// Slots are written as at most two hex digits.
pub const MAX_PROFILES: usize = 256;

#[derive(Debug, Error)]
pub enum SmtError {
    #[error("A Pcb name must be changed.")]
    PcbName,

    #[error("{0} ->ERP Number duplicated....")]
    DuplicatePartReference(String),

    #[error("{0} -> Missing PLACE Designator on the BOM File!")]
    UnmatchedDesignator(String),

    #[error("ERROR Missing ERP Number; {0}")]
    MissingPartReference(String),

    #[error("Invalid part reference \"{0}\"")]
    InvalidPartReference(String),

    #[error("temp file error: {path}: {source}")]
    Template { path: PathBuf, source: io::Error },

    #[error("{part_ref}.txt file read error! ({path}: {source})")]
    ProfileRead {
        part_ref: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{0}.txt file missing head info!")]
    MissingHeadInfo(String),

    #[error("{0}.txt is too short to hold a profile number")]
    ProfileTooShort(String),

    #[error("temp file cannot read {0}!")]
    MissingMarker(&'static str),

    #[error("Wrong number of {field} content '{value}' ({designator})")]
    Field {
        field: &'static str,
        value: String,
        designator: String,
    },

    #[error("Too many profiles: at most {MAX_PROFILES} part references fit in one file")]
    TooManyProfiles,

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

const COL_X: usize = 1;
const COL_Y: usize = 2;
const COL_ROTATION: usize = 3;
const COL_DESIGNATOR: usize = 4;
const COL_PART_REF: usize = 5;

const BOM_COL_PART_REF: usize = 1;
const BOM_COL_DESIGNATORS: usize = 3;

/// One row of the placement sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRow {
    pub x: String,
    pub y: String,
    pub rotation: String,
    pub designator: String,
    /// Column 5, only read when BOM correlation is skipped
    pub part_ref: String,
}

/// Read placement rows until the first empty X cell.
pub fn read_placements<S: TabularSource + ?Sized>(source: &S, with_part_ref: bool) -> Vec<PlacementRow> {
    (FIRST_DATA_ROW..=MAX_ROW)
        .map(|row| (row, source.cell(row, COL_X)))
        .take_while(|(_, x)| !x.is_empty())
        .map(|(row, x)| PlacementRow {
            x,
            y: source.cell(row, COL_Y),
            rotation: source.cell(row, COL_ROTATION),
            designator: source.cell(row, COL_DESIGNATOR),
            part_ref: if with_part_ref {
                source.cell(row, COL_PART_REF)
            } else {
                String::new()
            },
        })
        .collect()
}

/// A BOM line for placement: a part reference and the designators it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomPart {
    pub part_ref: String,
    /// Designators with spaces removed
    pub designators: Vec<String>,
}

impl BomPart {
    pub fn covers(&self, designator: &str) -> bool {
        self.designators.iter().any(|d| d == designator)
    }
}

/// Read BOM parts until the first empty designator cell.
///
/// A part reference listed twice is rejected.
pub fn read_bom_parts<S: TabularSource + ?Sized>(source: &S) -> Result<Vec<BomPart>, SmtError> {
    let mut parts: Vec<BomPart> = Vec::new();

    for row in FIRST_DATA_ROW..=MAX_ROW {
        let designators = source.cell(row, BOM_COL_DESIGNATORS);
        if designators.is_empty() {
            break;
        }
        let part_ref = source.cell(row, BOM_COL_PART_REF);
        if !part_ref.is_empty() && parts.iter().any(|p| p.part_ref == part_ref) {
            return Err(SmtError::DuplicatePartReference(part_ref));
        }
        parts.push(BomPart {
            part_ref,
            designators: designators.split(',').map(|d| d.replace(' ', "")).collect(),
        });
    }

    Ok(parts)
}

/// Output of a successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub content: String,
    /// Part references in slot order
    pub profiles: Vec<String>,
    pub placements: usize,
}

/// Combines sheets, profiles and the template into a placement program.
pub struct PlacementGenerator {
    library: ProfileLibrary,
}

impl PlacementGenerator {
    pub fn new(library: ProfileLibrary) -> Self {
        Self { library }
    }

    /// Generate the placement program.
    ///
    /// With `bom` = `None`, part references come from column 5 of the
    /// placement sheet.
    pub fn generate(
        &self,
        pcb_name: &str,
        placement: &dyn TabularSource,
        bom: Option<&dyn TabularSource>,
    ) -> Result<GeneratedFile, SmtError> {
        let pcb_name = pcb_name.trim();
        if pcb_name.is_empty() || pcb_name == PLACEHOLDER_PCB_NAME {
            return Err(SmtError::PcbName);
        }

        let bom_parts = bom.map(read_bom_parts).transpose()?;
        let rows = read_placements(placement, bom_parts.is_none());
        tracing::debug!(rows = rows.len(), "placement rows read");

        let mut text = self.library.template()?;

        let part_refs = rows
            .iter()
            .map(|row| resolve_part_ref(row, bom_parts.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut profiles: Vec<Profile> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for part_ref in &part_refs {
            if slots.contains_key(part_ref.as_str()) {
                continue;
            }
            if profiles.len() >= MAX_PROFILES {
                return Err(SmtError::TooManyProfiles);
            }
            let slot = profiles.len();
            let profile = Profile::parse(part_ref, slot, &self.library.read(part_ref)?)?;
            template::insert_before(&mut text, template::MARKER_PROFILES_END, &profile.content)?;
            tracing::debug!(part_ref = %part_ref, slot, heads = ?profile.heads, "profile added");

            slots.insert(part_ref.as_str(), slot);
            profiles.push(profile);
        }

        template::overwrite_after(&mut text, template::MARKER_PCB_NAME, pcb_name)?;

        let mut records = String::new();
        for (row, part_ref) in rows.iter().zip(&part_refs) {
            let profile = &mut profiles[slots[part_ref.as_str()]];
            let record = Record {
                x: &row.x,
                y: &row.y,
                rotation: &row.rotation,
                designator: &row.designator,
                part_ref,
                head: profile.next_head(),
                slot: profile.slot,
            };
            records.push_str(&record.render()?);
        }
        template::insert_before(&mut text, template::MARKER_PLACEMENTS, &records)?;
        text.push('\n');

        Ok(GeneratedFile {
            content: text,
            profiles: profiles.into_iter().map(|p| p.part_ref).collect(),
            placements: rows.len(),
        })
    }
}

fn resolve_part_ref(row: &PlacementRow, bom: Option<&[BomPart]>) -> Result<String, SmtError> {
    let part_ref = match bom {
        None => row.part_ref.clone(),
        Some(parts) => parts
            .iter()
            .find(|p| p.covers(&row.designator))
            .map(|p| p.part_ref.clone())
            .ok_or_else(|| SmtError::UnmatchedDesignator(row.designator.clone()))?,
    };
    if part_ref.is_empty() {
        return Err(SmtError::MissingPartReference(row.designator.clone()));
    }
    Ok(part_ref)
}

/// A generation request with its input files.
#[derive(Debug, Clone)]
pub struct SmtJob {
    pub pcb_name: String,
    pub placement_path: PathBuf,
    /// `None` skips BOM correlation
    pub bom_path: Option<PathBuf>,
    pub profile_dir: PathBuf,
}

impl SmtJob {
    /// Load the sheets and generate the placement program.
    pub fn run(&self) -> Result<GeneratedFile, SmtError> {
        // Reject the name before any sheet is opened
        if self.pcb_name.trim().is_empty() || self.pcb_name.trim() == PLACEHOLDER_PCB_NAME {
            return Err(SmtError::PcbName);
        }

        let bom = self
            .bom_path
            .as_deref()
            .map(Worksheet::open)
            .transpose()?;
        let placement = Worksheet::open(&self.placement_path)?;

        let generator = PlacementGenerator::new(ProfileLibrary::new(&self.profile_dir));
        generator.generate(
            &self.pcb_name,
            &placement,
            bom.as_ref().map(|b| b as &dyn TabularSource),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "HEADER\nPCBNAME=GTMxxx01\nEnd_of_FD\n&B.OPT\nEND\n";

    fn library(profiles: &[(&str, &str)]) -> (TempDir, PlacementGenerator) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("board_temp.txt"), TEMPLATE).unwrap();
        for (name, content) in profiles {
            fs::write(temp_dir.path().join(format!("{}.txt", name)), content).unwrap();
        }
        let generator = PlacementGenerator::new(ProfileLibrary::new(temp_dir.path()));
        (temp_dir, generator)
    }

    fn placement(rows: &[[&str; 5]]) -> Worksheet {
        let mut all = vec![vec!["X", "Y", "Rot", "Designator", "Part"]];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Worksheet::from_rows(all)
    }

    fn bom(rows: &[[&str; 3]]) -> Worksheet {
        let mut all = vec![vec!["Part", "Qty", "Designators"]];
        all.extend(rows.iter().map(|r| r.to_vec()));
        Worksheet::from_rows(all)
    }

    #[test]
    fn test_generate_with_bom() {
        let (_dir, generator) = library(&[
            ("100-0001", "FD 000 HEAD=1,2 R\n"),
            ("200-0002", "FD 000 HEAD=4 C\n"),
        ]);
        let place = placement(&[
            ["10.00", "20.00", "90", "R1", ""],
            ["11.00", "20.00", "360", "C1", ""],
            ["12.00", "20.00", "0", "R2", ""],
        ]);
        let bom = bom(&[["100-0001", "2", "R1, R2"], ["200-0002", "1", "C1"]]);

        let out = generator.generate("GTM10201", &place, Some(&bom)).unwrap();
        assert_eq!(out.profiles, vec!["100-0001", "200-0002"]);
        assert_eq!(out.placements, 3);

        let lines: Vec<&str> = out.content.lines().collect();
        assert_eq!(lines[0], "HEADER");
        assert_eq!(lines[1], "PCBNAME=GTM10201");
        assert_eq!(lines[2], "FD 000 HEAD=1,2 R");
        assert_eq!(lines[3], "FD 001 HEAD=4 C");
        assert_eq!(lines[4], "End_of_FD");
        assert!(lines[5].starts_with("   10.00    20.00     0.00    90.00 0A0000FFFF0001000000FFFF00000000 R1>>>100-0001"));
        assert!(lines[6].contains("     0.00 0A0000FFFF0001000300FFFF00000001 C1>>>200-0002"));
        assert!(lines[7].contains("0A0000FFFF0001000100FFFF00000000 R2>>>100-0001"));
        assert_eq!(lines[8], "&B.OPT");
        assert!(out.content.ends_with("END\n\n"));
    }

    #[test]
    fn test_generate_skip_bom_uses_part_column() {
        let (_dir, generator) = library(&[("P1", "FD 000 HEAD=8 X\n")]);
        let place = placement(&[["1.00", "2.00", "180", "U1", "P1"]]);

        let out = generator.generate("BOARD1", &place, None).unwrap();
        assert!(out.content.contains("0A0000FFFF0001000700FFFF00000000 U1>>>P1"));
    }

    /// One row and one single-head profile per part `P0..P<count>`.
    fn distinct_parts(count: usize) -> (TempDir, PlacementGenerator, Worksheet) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("board_temp.txt"), TEMPLATE).unwrap();
        let mut rows = vec![vec![
            "X".to_string(),
            "Y".to_string(),
            "Rot".to_string(),
            "Designator".to_string(),
            "Part".to_string(),
        ]];
        for i in 0..count {
            fs::write(temp_dir.path().join(format!("P{}.txt", i)), "FD 000 HEAD=1 X\n").unwrap();
            rows.push(vec![
                "1.00".to_string(),
                "2.00".to_string(),
                "0".to_string(),
                format!("U{}", i),
                format!("P{}", i),
            ]);
        }
        let generator = PlacementGenerator::new(ProfileLibrary::new(temp_dir.path()));
        (temp_dir, generator, Worksheet::from_rows(rows))
    }

    #[test]
    fn test_generate_many_profiles() {
        let (_dir, generator, place) = distinct_parts(17);

        let out = generator.generate("GTM10201", &place, None).unwrap();
        assert_eq!(out.profiles.len(), 17);

        let lines: Vec<&str> = out.content.lines().collect();
        assert_eq!(lines[2 + 10], "FD 010 HEAD=1 X");
        assert_eq!(lines[2 + 16], "FD 016 HEAD=1 X");
        assert_eq!(lines[2 + 17], "End_of_FD");

        let records = &lines[2 + 18..];
        assert!(records[15].contains("0A0000FFFF0001000000FFFF0000000F U15>>>P15"));
        assert!(records[16].contains("0A0000FFFF0001000000FFFF00000010 U16>>>P16"));
        assert!(records[10].contains("00FFFF0000000A U10>>>P10"));
    }

    #[test]
    fn test_generate_profile_cap() {
        let (_dir, generator, place) = distinct_parts(MAX_PROFILES);
        let out = generator.generate("GTM10201", &place, None).unwrap();
        assert_eq!(out.profiles.len(), MAX_PROFILES);
        assert!(out.content.contains("FD 255 HEAD=1 X\n"));
        assert!(out.content.contains("00FFFF000000FF U255>>>P255"));

        let (_dir, generator, place) = distinct_parts(MAX_PROFILES + 1);
        assert!(matches!(
            generator.generate("GTM10201", &place, None),
            Err(SmtError::TooManyProfiles)
        ));
    }

    #[test]
    fn test_skip_bom_requires_part_reference() {
        let (_dir, generator) = library(&[]);
        let place = placement(&[["1.00", "2.00", "0", "U1", ""]]);
        assert!(matches!(
            generator.generate("BOARD1", &place, None),
            Err(SmtError::MissingPartReference(d)) if d == "U1"
        ));
    }

    #[test]
    fn test_unmatched_designator_is_fatal() {
        let (_dir, generator) = library(&[("100-0001", "FD 000 HEAD=1 R\n")]);
        let place = placement(&[["1.00", "2.00", "0", "R9", ""]]);
        let bom = bom(&[["100-0001", "1", "R1"]]);
        assert!(matches!(
            generator.generate("BOARD1", &place, Some(&bom)),
            Err(SmtError::UnmatchedDesignator(d)) if d == "R9"
        ));
    }

    #[test]
    fn test_duplicate_part_reference_rejected() {
        let (_dir, generator) = library(&[]);
        let place = placement(&[["1.00", "2.00", "0", "R1", ""]]);
        let bom = bom(&[["100-0001", "1", "R1"], ["100-0001", "1", "R2"]]);
        assert!(matches!(
            generator.generate("BOARD1", &place, Some(&bom)),
            Err(SmtError::DuplicatePartReference(p)) if p == "100-0001"
        ));
    }

    #[test]
    fn test_placeholder_pcb_name_rejected() {
        let (_dir, generator) = library(&[]);
        let place = placement(&[]);
        assert!(matches!(
            generator.generate(PLACEHOLDER_PCB_NAME, &place, None),
            Err(SmtError::PcbName)
        ));
        assert!(matches!(generator.generate("  ", &place, None), Err(SmtError::PcbName)));
    }

    #[test]
    fn test_missing_profile_file() {
        let (_dir, generator) = library(&[]);
        let place = placement(&[["1.00", "2.00", "0", "U1", "NOPE"]]);
        assert!(matches!(
            generator.generate("BOARD1", &place, None),
            Err(SmtError::ProfileRead { .. })
        ));
    }

    #[test]
    fn test_bad_coordinate_aborts() {
        let (_dir, generator) = library(&[("P1", "FD 000 HEAD=1 X\n")]);
        let place = placement(&[["1234567.5", "2.00", "0", "U1", "P1"]]);
        assert!(matches!(
            generator.generate("BOARD1", &place, None),
            Err(SmtError::Field { field: "X", .. })
        ));
    }

    #[test]
    fn test_read_bom_parts_strips_spaces() {
        let sheet = bom(&[["A", "2", "R1, R2 ,R3"], ["", "", ""], ["B", "1", "C1"]]);
        let parts = read_bom_parts(&sheet).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].designators, vec!["R1", "R2", "R3"]);
        assert!(parts[0].covers("R3"));
    }

    #[test]
    fn test_job_reads_csv_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("board_temp.txt"), TEMPLATE).unwrap();
        fs::write(dir.join("P1.txt"), "FD 000 HEAD=2 X\n").unwrap();
        fs::write(dir.join("place.csv"), "X,Y,Rot,Des,Part\n5.5,6.5,270,D1,\n").unwrap();
        fs::write(dir.join("bom.csv"), "Part,Qty,Des\nP1,1,D1\n").unwrap();

        let job = SmtJob {
            pcb_name: "BOARD1".to_string(),
            placement_path: dir.join("place.csv"),
            bom_path: Some(dir.join("bom.csv")),
            profile_dir: dir.to_path_buf(),
        };
        let out = job.run().unwrap();
        assert!(out.content.contains("    5.5      6.5      0.00   270.00 "));
        assert!(out.content.contains("D1>>>P1"));
    }

    #[test]
    fn test_job_rejects_placeholder_before_opening_sheets() {
        let temp_dir = TempDir::new().unwrap();
        let job = SmtJob {
            pcb_name: PLACEHOLDER_PCB_NAME.to_string(),
            placement_path: temp_dir.path().join("missing.csv"),
            bom_path: None,
            profile_dir: temp_dir.path().to_path_buf(),
        };
        assert!(matches!(job.run(), Err(SmtError::PcbName)));
    }
}
