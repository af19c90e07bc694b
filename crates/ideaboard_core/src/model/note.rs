//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical idea card record and its link preview payload.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `category_id` always references exactly one category of the board.
//! - `pinned` and `archived` are independent flags.

use crate::model::category::CategoryId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of one note.
pub type NoteId = Uuid;

/// Metadata describing the first URL found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub site_name: String,
}

/// One user-authored idea card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable identity, never reused.
    pub id: NoteId,
    /// Free-form user text.
    pub text: String,
    /// Owning category.
    pub category_id: CategoryId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub pinned: bool,
    pub archived: bool,
    /// Preview of the first URL in `text`, when enriched or set explicitly.
    pub link_data: Option<LinkData>,
}

impl Note {
    /// Creates a new unpinned, active note with a generated ID.
    pub fn new(category_id: CategoryId, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), category_id, text, now_epoch_ms())
    }

    /// Creates a note with caller-provided identity and creation time.
    ///
    /// Used by storage read-back where identity already exists.
    pub fn with_id(
        id: NoteId,
        category_id: CategoryId,
        text: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            category_id,
            created_at,
            pinned: false,
            archived: false,
            link_data: None,
        }
    }

    /// Returns whether the note belongs to the primary board view.
    pub fn is_active(&self) -> bool {
        !self.archived
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::Note;
    use uuid::Uuid;

    #[test]
    fn new_note_starts_active_and_unpinned() {
        let note = Note::new(Uuid::new_v4(), "draft idea");
        assert!(note.is_active());
        assert!(!note.pinned);
        assert!(note.link_data.is_none());
        assert!(note.created_at > 0);
    }

    #[test]
    fn new_notes_get_distinct_ids() {
        let category = Uuid::new_v4();
        let a = Note::new(category, "a");
        let b = Note::new(category, "b");
        assert_ne!(a.id, b.id);
    }
}
