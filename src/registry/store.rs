//! Registry persistence.
//!
//! The registry lives at `<data-dir>/data.json`. A missing file is an empty
//! registry.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Registry;

/// On-disk envelope for the registry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRegistry {
    /// When the registry was last written
    saved_at: DateTime<Utc>,
    #[serde(flatten)]
    registry: Registry,
}

/// Reads and writes the registry file.
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Store for the registry inside a data directory.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("data.json"),
        }
    }

    pub fn load(&self) -> Result<Registry> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no registry file, starting empty");
            return Ok(Registry::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read registry file: {}", self.path.display()))?;

        let stored: StoredRegistry = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse registry file: {}", self.path.display()))?;

        tracing::debug!(saved_at = %stored.saved_at, "loaded registry");
        Ok(stored.registry)
    }

    pub fn save(&self, registry: &Registry) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }

        let stored = StoredRegistry {
            saved_at: Utc::now(),
            registry: registry.clone(),
        };

        let content =
            serde_json::to_string_pretty(&stored).context("Failed to serialize registry")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write registry file: {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), "registry saved");
        Ok(())
    }
}
