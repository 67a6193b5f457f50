//! CLI command handlers.

pub mod bom;
pub mod inventory;
pub mod settings;
pub mod smt;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::config::{DataDir, Settings};
use crate::registry::store::RegistryStore;
use crate::registry::Registry;

/// Everything a command needs from the data directory.
pub struct Session {
    pub data_dir: DataDir,
    pub settings: Settings,
    pub registry: Registry,
    store: RegistryStore,
}

impl Session {
    pub fn open(data_dir: DataDir) -> Result<Self> {
        let settings = data_dir.load_settings()?;
        let store = RegistryStore::new(data_dir.root());
        let registry = store.load()?;
        Ok(Self {
            data_dir,
            settings,
            registry,
            store,
        })
    }

    /// Persist the registry.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.registry)
    }
}

/// Ask a yes/no question, defaulting to no. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}
