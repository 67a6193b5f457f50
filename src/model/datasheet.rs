//! Datasheet references.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of a datasheet document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasheetKind {
    #[default]
    Normal,
    Summary,
    Errata,
    UsersGuide,
}

impl DatasheetKind {
    pub const ALL: [DatasheetKind; 4] = [
        DatasheetKind::Normal,
        DatasheetKind::Summary,
        DatasheetKind::Errata,
        DatasheetKind::UsersGuide,
    ];

    /// Display names of every kind, in declaration order.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|k| k.to_string()).collect()
    }

    fn as_str(&self) -> &'static str {
        match self {
            DatasheetKind::Normal => "Datasheet",
            DatasheetKind::Summary => "Summary",
            DatasheetKind::Errata => "Errata",
            DatasheetKind::UsersGuide => "User's Guide",
        }
    }
}

impl fmt::Display for DatasheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasheetKind {
    type Err = String;

    /// Accepts the display name as well as the CLI spelling
    /// (`normal`, `summary`, `errata`, `users-guide`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(kind) = Self::ALL.iter().find(|k| k.as_str() == s) {
            return Ok(*kind);
        }
        match s.to_lowercase().as_str() {
            "normal" | "datasheet" => Ok(DatasheetKind::Normal),
            "summary" => Ok(DatasheetKind::Summary),
            "errata" => Ok(DatasheetKind::Errata),
            "users-guide" | "users_guide" | "user's guide" => Ok(DatasheetKind::UsersGuide),
            _ => Err(format!(
                "unknown datasheet kind '{}' (expected one of: {})",
                s,
                Self::names().join(", ")
            )),
        }
    }
}

/// A datasheet file attached to a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasheet {
    pub path: PathBuf,
    #[serde(default)]
    pub kind: DatasheetKind,
}
