//! Note and tag read models.

use serde::{Deserialize, Serialize};

/// Storage-assigned note identifier.
pub type NoteId = i64;

/// Storage-assigned tag identifier.
pub type TagId = i64;

/// One note as persisted, together with its current tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    /// Raw body exactly as written by the caller, tag line included.
    pub body: String,
    /// Last body write in epoch milliseconds.
    pub modified_at: i64,
    /// Creation time in epoch milliseconds. Never changes.
    pub created_at: i64,
    /// Tag names sorted ascending (byte order), without the `#` prefix.
    pub tags: Vec<String>,
}

impl NoteRecord {
    /// Returns whether the note carries every tag in `required`.
    pub fn has_all_tags<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .all(|tag| self.tags.iter().any(|own| own == tag.as_ref()))
    }

    /// Tag names joined by single spaces, as shown in listings.
    pub fn tag_line(&self) -> String {
        self.tags.join(" ")
    }
}

/// A tag together with the number of notes that currently use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    pub name: String,
    pub id: TagId,
    pub usage_count: u64,
}
