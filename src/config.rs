//! General settings and data directory layout.
//!
//! Settings live at `<data-dir>/settings.json`; the data directory defaults
//! to `~/.co`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the board template inside the profile directory.
pub const BOARD_TEMPLATE: &str = "board_temp.txt";

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remember window dimensions (kept for front ends that have windows)
    pub save_layout: bool,
    /// Highlight components that are out of stock in listings
    pub mark_low_stock: bool,
    /// Show the container column in component listings
    pub show_containers: bool,
    /// Default for `smt generate`: take part references from the placement file
    pub skip_bom: bool,
    /// Override for the SMT profile directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_layout: true,
            mark_low_stock: true,
            show_containers: true,
            skip_bom: false,
            profile_dir: None,
        }
    }
}

/// Resolved locations of everything the tool persists.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Use `explicit` when given, otherwise `~/.co`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let root = explicit.unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".co")
        });
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Profile directory, honouring the settings override.
    pub fn profile_dir(&self, settings: &Settings) -> PathBuf {
        settings
            .profile_dir
            .clone()
            .unwrap_or_else(|| self.root.join("profiles"))
    }

    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create data directory: {}", self.root.display()))?;

        let path = self.settings_path();
        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }
}
