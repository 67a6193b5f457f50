//! Two-level label tree.

use serde::{Deserialize, Serialize};

/// A top-level label and the leaf labels filed under it.
///
/// Leaves are plain names: they have no children of their own and always
/// belong to exactly one top label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub leaves: Vec<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leaves: Vec::new(),
        }
    }

    pub fn has_leaf(&self, name: &str) -> bool {
        self.leaves.iter().any(|l| l == name)
    }

    pub(crate) fn add_leaf(&mut self, name: impl Into<String>) {
        self.leaves.push(name.into());
    }

    pub(crate) fn remove_leaf(&mut self, name: &str) -> bool {
        let before = self.leaves.len();
        self.leaves.retain(|l| l != name);
        self.leaves.len() != before
    }
}
