//! Canonical board snapshot.
//!
//! # Responsibility
//! - Hold categories, notes and per-category note orders as one value.
//! - Answer the read queries rendering needs.
//!
//! # Invariants
//! - Snapshots are immutable once published behind an `Arc`; mutations
//!   work on a cloned draft and publish a new snapshot.
//! - `revision` strictly increases across published snapshots.
//! - Every note appears in exactly one lane, matching its `category_id`.

use crate::model::category::{Category, CategoryId};
use crate::model::note::{Note, NoteId};
use crate::ordering::{NoteOrdering, OrderingError};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub(crate) revision: u64,
    pub(crate) categories: Vec<Category>,
    pub(crate) notes: HashMap<NoteId, Note>,
    pub(crate) ordering: NoteOrdering,
}

impl BoardState {
    /// Creates an empty board with the given categories.
    pub fn with_categories(categories: Vec<Category>) -> Self {
        let mut ordering = NoteOrdering::new();
        for category in &categories {
            ordering.add_lane(category.id);
        }
        Self {
            revision: 0,
            categories,
            notes: HashMap::new(),
            ordering,
        }
    }

    /// Rebuilds a board from stored records.
    ///
    /// `notes` must be listed in lane order within each category.
    pub fn from_parts(
        revision: u64,
        categories: Vec<Category>,
        notes: Vec<Note>,
    ) -> Result<Self, OrderingError> {
        let mut state = Self::with_categories(categories);
        state.revision = revision;
        for note in notes {
            state.insert_note(note, None)?;
        }
        Ok(state)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, category_id: CategoryId) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    pub fn note(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.get(&note_id)
    }

    pub fn notes_len(&self) -> usize {
        self.notes.len()
    }

    /// Full lane order, archived notes included.
    pub fn lane(&self, category_id: CategoryId) -> &[NoteId] {
        self.ordering.lane(category_id)
    }

    /// Notes of one lane in order, archived notes included.
    pub fn lane_notes(&self, category_id: CategoryId) -> Vec<&Note> {
        self.lane(category_id)
            .iter()
            .filter_map(|id| self.notes.get(id))
            .collect()
    }

    /// Primary board view of one category.
    pub fn active_notes(&self, category_id: CategoryId) -> Vec<&Note> {
        self.lane_notes(category_id)
            .into_iter()
            .filter(|note| note.is_active())
            .collect()
    }

    /// Archived view across all categories, in category then lane order.
    pub fn archived_notes(&self) -> Vec<&Note> {
        self.categories
            .iter()
            .flat_map(|category| self.lane_notes(category.id))
            .filter(|note| note.archived)
            .collect()
    }

    /// Resolves a note to its `(category, index)` slot.
    pub fn position(&self, note_id: NoteId) -> Option<(CategoryId, usize)> {
        self.ordering.position(note_id)
    }

    /// Maps an index into the visible list of a lane to a lane slot, as
    /// seen once `moving` has left the lane.
    ///
    /// The slot lands right after the visible note at `visible_index - 1`,
    /// so archived notes in between stay ahead of the moved note. Indices
    /// past the visible list map to the lane end.
    pub fn view_slot(
        &self,
        category_id: CategoryId,
        moving: NoteId,
        visible_index: usize,
    ) -> usize {
        if visible_index == 0 {
            return 0;
        }
        let lane: Vec<NoteId> = self
            .lane(category_id)
            .iter()
            .copied()
            .filter(|id| *id != moving)
            .collect();
        lane.iter()
            .enumerate()
            .filter(|(_, id)| self.notes.get(*id).is_some_and(Note::is_active))
            .nth(visible_index - 1)
            .map_or(lane.len(), |(slot, _)| slot + 1)
    }

    /// Verifies category uniqueness, lane coverage and the exactly-once
    /// note placement.
    pub fn check_consistency(&self) -> bool {
        let mut category_ids = HashSet::new();
        let categories_ok = self
            .categories
            .iter()
            .all(|category| category_ids.insert(category.id) && self.ordering.has_lane(category.id));
        categories_ok && self.ordering.is_consistent_with(&self.notes)
    }

    pub(crate) fn insert_note(
        &mut self,
        note: Note,
        index: Option<usize>,
    ) -> Result<usize, OrderingError> {
        if self.notes.contains_key(&note.id) {
            return Err(OrderingError::DuplicateNote(note.id));
        }
        let applied = self.ordering.insert(note.category_id, note.id, index)?;
        self.notes.insert(note.id, note);
        Ok(applied)
    }

    pub(crate) fn remove_note(&mut self, note_id: NoteId) -> Option<Note> {
        self.ordering.remove(note_id);
        self.notes.remove(&note_id)
    }

    pub(crate) fn add_category(&mut self, category: Category) {
        self.ordering.add_lane(category.id);
        self.categories.push(category);
    }
}
