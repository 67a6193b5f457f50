//! Per-part placement profiles.
//!
//! A profile is a text block named `<part-reference>.txt` in the profile
//! directory. It carries a `HEAD` marker whose following characters, up to
//! the next space, list the usable placement heads as digits 1–8. The
//! profile's slot number is written right-aligned into character positions
//! 3–5 before the block is spliced into the board template.

use std::fs;
use std::path::PathBuf;

use super::SmtError;
use crate::config::BOARD_TEMPLATE;

/// Character position just past the slot number field.
const SLOT_FIELD_END: usize = 6;

/// Profile and template files on disk.
#[derive(Debug, Clone)]
pub struct ProfileLibrary {
    dir: PathBuf,
}

impl ProfileLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the board template.
    pub fn template(&self) -> Result<String, SmtError> {
        let path = self.dir.join(BOARD_TEMPLATE);
        fs::read_to_string(&path).map_err(|source| SmtError::Template { path, source })
    }

    /// Read the raw profile text for a part reference.
    pub fn read(&self, part_ref: &str) -> Result<String, SmtError> {
        if part_ref.contains(['/', '\\']) || part_ref == ".." {
            return Err(SmtError::InvalidPartReference(part_ref.to_string()));
        }
        let path = self.dir.join(format!("{}.txt", part_ref));
        tracing::debug!(path = %path.display(), "reading profile");
        fs::read_to_string(&path).map_err(|source| SmtError::ProfileRead {
            part_ref: part_ref.to_string(),
            path,
            source,
        })
    }
}

/// A loaded profile bound to a slot.
#[derive(Debug, Clone)]
pub struct Profile {
    pub part_ref: String,
    pub slot: usize,
    /// Usable heads, 1–8, in the order listed
    pub heads: Vec<u8>,
    /// Profile text with the slot number written in
    pub content: String,
    next_head: usize,
}

impl Profile {
    pub fn parse(part_ref: &str, slot: usize, text: &str) -> Result<Self, SmtError> {
        let heads = parse_heads(text)
            .ok_or_else(|| SmtError::MissingHeadInfo(part_ref.to_string()))?;
        if heads.is_empty() {
            return Err(SmtError::MissingHeadInfo(part_ref.to_string()));
        }
        let content = write_slot(text, slot)
            .ok_or_else(|| SmtError::ProfileTooShort(part_ref.to_string()))?;

        Ok(Self {
            part_ref: part_ref.to_string(),
            slot,
            heads,
            content,
            next_head: 0,
        })
    }

    /// Next head in round-robin order.
    pub fn next_head(&mut self) -> u8 {
        let head = self.heads[self.next_head];
        self.next_head = (self.next_head + 1) % self.heads.len();
        head
    }
}

/// Digits 1–8 between the first `HEAD` and the next space.
///
/// `None` when there is no `HEAD` marker or no terminating space.
fn parse_heads(text: &str) -> Option<Vec<u8>> {
    let start = text.find("HEAD")?;
    let rest = &text[start..];
    let end = rest.find(' ')?;
    Some(
        rest[..end]
            .chars()
            .filter(|c| ('1'..='8').contains(c))
            .map(|c| c as u8 - b'0')
            .collect(),
    )
}

/// Overwrite the slot field so the number ends at position 5.
fn write_slot(text: &str, slot: usize) -> Option<String> {
    let digits = slot.to_string();
    let start = SLOT_FIELD_END.checked_sub(digits.len())?;
    if text.len() < SLOT_FIELD_END
        || !text.is_char_boundary(start)
        || !text.is_char_boundary(SLOT_FIELD_END)
    {
        return None;
    }
    let mut out = text.to_string();
    out.replace_range(start..SLOT_FIELD_END, &digits);
    Some(out)
}
