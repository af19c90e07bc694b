//! Note lifecycle state machine.
//!
//! # Responsibility
//! - Guard destructive deletion behind a two-step confirmation.
//! - Flip the persisted `pinned` / `archived` flags.
//!
//! # Invariants
//! - Confirmation state lives in a side table keyed by note id, never on
//!   the persisted note.
//! - `request_delete` never removes a note; only `confirm_delete` after a
//!   prior request does.
//! - Pin and archive are legal from any state and never touch the
//!   confirmation state or each other.

use crate::model::note::{Note, NoteId};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ephemeral per-note interaction state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Normal,
    ConfirmingDelete,
}

/// Errors from lifecycle transitions. Both leave state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    NotFound(NoteId),
    /// `confirm_delete` without a prior `request_delete`.
    NotAwaitingConfirmation(NoteId),
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::NotAwaitingConfirmation(id) => {
                write!(f, "note is not awaiting delete confirmation: {id}")
            }
        }
    }
}

impl Error for LifecycleError {}

/// Side table of delete-confirmation state.
#[derive(Debug, Clone, Default)]
pub struct NoteLifecycleManager {
    states: HashMap<NoteId, LifecycleState>,
}

impl NoteLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; unknown ids read as `Normal`.
    pub fn state(&self, note_id: NoteId) -> LifecycleState {
        self.states.get(&note_id).copied().unwrap_or_default()
    }

    /// Note ids currently awaiting confirmation.
    pub fn pending(&self) -> Vec<NoteId> {
        self.states
            .iter()
            .filter(|(_, state)| **state == LifecycleState::ConfirmingDelete)
            .map(|(id, _)| *id)
            .collect()
    }

    /// `Normal -> ConfirmingDelete`. Repeating the request is idempotent.
    pub fn request_delete(
        &mut self,
        notes: &HashMap<NoteId, Note>,
        note_id: NoteId,
    ) -> Result<LifecycleState, LifecycleError> {
        ensure_exists(notes, note_id)?;
        self.states
            .insert(note_id, LifecycleState::ConfirmingDelete);
        debug!(
            "event=delete_request module=lifecycle status=ok note_id={}",
            note_id
        );
        Ok(LifecycleState::ConfirmingDelete)
    }

    /// Accepts a pending deletion. The caller removes the note itself.
    pub fn confirm_delete(
        &mut self,
        notes: &HashMap<NoteId, Note>,
        note_id: NoteId,
    ) -> Result<(), LifecycleError> {
        ensure_exists(notes, note_id)?;
        if self.state(note_id) != LifecycleState::ConfirmingDelete {
            return Err(LifecycleError::NotAwaitingConfirmation(note_id));
        }
        self.states.remove(&note_id);
        Ok(())
    }

    /// `ConfirmingDelete -> Normal`.
    pub fn cancel_delete(
        &mut self,
        notes: &HashMap<NoteId, Note>,
        note_id: NoteId,
    ) -> Result<LifecycleState, LifecycleError> {
        ensure_exists(notes, note_id)?;
        self.states.remove(&note_id);
        Ok(LifecycleState::Normal)
    }

    /// Pointer/focus left the note. Returns whether a pending delete reverted.
    pub fn focus_lost(
        &mut self,
        notes: &HashMap<NoteId, Note>,
        note_id: NoteId,
    ) -> Result<bool, LifecycleError> {
        ensure_exists(notes, note_id)?;
        Ok(self.revert(note_id, "focus_lost"))
    }

    /// Reverts every pending delete except `keep`.
    pub fn focus_moved_to(&mut self, keep: Option<NoteId>) -> usize {
        let reverted: Vec<NoteId> = self
            .pending()
            .into_iter()
            .filter(|id| Some(*id) != keep)
            .collect();
        for id in &reverted {
            self.revert(*id, "focus_moved");
        }
        reverted.len()
    }

    fn revert(&mut self, note_id: NoteId, reason: &str) -> bool {
        let reverted = self.states.remove(&note_id).is_some();
        if reverted {
            debug!(
                "event=delete_revert module=lifecycle status=ok reason={} note_id={}",
                reason, note_id
            );
        }
        reverted
    }
}

/// Flips `pinned`. Returns the new value.
pub fn toggle_pin(note: &mut Note) -> bool {
    note.pinned = !note.pinned;
    note.pinned
}

/// Sets `archived`. Returns whether the flag changed.
pub fn set_archived(note: &mut Note, archived: bool) -> bool {
    let changed = note.archived != archived;
    note.archived = archived;
    changed
}

fn ensure_exists(notes: &HashMap<NoteId, Note>, note_id: NoteId) -> Result<(), LifecycleError> {
    if notes.contains_key(&note_id) {
        Ok(())
    } else {
        Err(LifecycleError::NotFound(note_id))
    }
}
