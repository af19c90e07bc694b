//! Note ordering engine.
//!
//! # Responsibility
//! - Own the per-category total order of notes.
//! - Perform within-lane reorders and cross-category moves atomically.
//!
//! # Invariants
//! - Every note id appears in exactly one lane, exactly once.
//! - A note's `category_id` always names the lane that holds it.
//! - All validation happens before the first mutation, so a failed call
//!   leaves lanes and notes untouched.
//! - Archived notes keep their slot; filtering happens in views.

pub mod drag;

use crate::model::category::CategoryId;
use crate::model::note::{Note, NoteId};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from ordering and drag-session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// Note id is unknown.
    NoteNotFound(NoteId),
    /// Category id has no lane.
    CategoryNotFound(CategoryId),
    /// Note exists but is not held by the named category.
    NotInCategory {
        note_id: NoteId,
        category_id: CategoryId,
    },
    /// Note id is already present in some lane.
    DuplicateNote(NoteId),
    /// Proposed lane order is not a permutation of the current one.
    InvalidSequence {
        category_id: CategoryId,
        expected_len: usize,
        actual_len: usize,
    },
    /// A drag session is already active and the policy rejects a new one.
    ConcurrentSession { active: NoteId, requested: NoteId },
    /// No drag session is active.
    NoActiveSession,
    /// Drag end names a different note than the active session.
    SessionMismatch { active: NoteId, requested: NoteId },
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::NotInCategory {
                note_id,
                category_id,
            } => write!(f, "note {note_id} is not in category {category_id}"),
            Self::DuplicateNote(id) => write!(f, "note already ordered: {id}"),
            Self::InvalidSequence {
                category_id,
                expected_len,
                actual_len,
            } => write!(
                f,
                "sequence for category {category_id} is not a permutation of its notes \
                 (expected {expected_len} or visible subset, got {actual_len})"
            ),
            Self::ConcurrentSession { active, requested } => write!(
                f,
                "drag session for note {active} is active; refusing to start {requested}"
            ),
            Self::NoActiveSession => write!(f, "no drag session is active"),
            Self::SessionMismatch { active, requested } => write!(
                f,
                "drag session is for note {active}, not {requested}"
            ),
        }
    }
}

impl Error for OrderingError {}

/// Moves the element at `from` to `to`, shifting the elements in between.
///
/// Returns the input unchanged when `from == to` or either index falls
/// outside `[0, len)`. The result is always a permutation of `items`.
pub fn reorder<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut reordered = items.to_vec();
    if from == to {
        return reordered;
    }
    if from >= reordered.len() || to >= reordered.len() {
        debug!(
            "event=reorder module=ordering status=noop reason=index_out_of_range from={} to={} len={}",
            from,
            to,
            reordered.len()
        );
        return reordered;
    }

    let item = reordered.remove(from);
    reordered.insert(to, item);
    reordered
}

/// Per-category ordered note ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteOrdering {
    lanes: HashMap<CategoryId, Vec<NoteId>>,
}

impl NoteOrdering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty lane. Existing lanes are kept as they are.
    pub fn add_lane(&mut self, category_id: CategoryId) {
        self.lanes.entry(category_id).or_default();
    }

    pub fn has_lane(&self, category_id: CategoryId) -> bool {
        self.lanes.contains_key(&category_id)
    }

    /// Ordered note ids of one lane. Unknown lanes read as empty.
    pub fn lane(&self, category_id: CategoryId) -> &[NoteId] {
        self.lanes
            .get(&category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of ordered notes across lanes.
    pub fn len(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a note to `(category, index)`.
    pub fn position(&self, note_id: NoteId) -> Option<(CategoryId, usize)> {
        self.lanes.iter().find_map(|(category_id, lane)| {
            lane.iter()
                .position(|id| *id == note_id)
                .map(|index| (*category_id, index))
        })
    }

    /// Inserts a note id into a lane at `index` (clamped), or appends.
    ///
    /// Returns the applied index.
    pub fn insert(
        &mut self,
        category_id: CategoryId,
        note_id: NoteId,
        index: Option<usize>,
    ) -> Result<usize, OrderingError> {
        if self.position(note_id).is_some() {
            return Err(OrderingError::DuplicateNote(note_id));
        }
        let lane = self
            .lanes
            .get_mut(&category_id)
            .ok_or(OrderingError::CategoryNotFound(category_id))?;
        let applied = index.unwrap_or(lane.len()).min(lane.len());
        lane.insert(applied, note_id);
        Ok(applied)
    }

    /// Removes a note id from whichever lane holds it.
    pub fn remove(&mut self, note_id: NoteId) -> Option<(CategoryId, usize)> {
        let (category_id, index) = self.position(note_id)?;
        if let Some(lane) = self.lanes.get_mut(&category_id) {
            lane.remove(index);
        }
        Some((category_id, index))
    }

    /// Reorders one lane in place. Returns whether the order changed.
    pub fn reorder_lane(
        &mut self,
        category_id: CategoryId,
        from: usize,
        to: usize,
    ) -> Result<bool, OrderingError> {
        let lane = self
            .lanes
            .get_mut(&category_id)
            .ok_or(OrderingError::CategoryNotFound(category_id))?;
        let reordered = reorder(lane.as_slice(), from, to);
        let changed = reordered != *lane;
        *lane = reordered;
        Ok(changed)
    }

    /// Moves one note into another category at `target_index`.
    ///
    /// `target_index` is clamped to `[0, destination_len]`. The note's
    /// `category_id` is rewritten in the same step. Moving within the same
    /// category behaves like a reorder to the clamped index.
    ///
    /// Returns the index the note landed on.
    pub fn move_across(
        &mut self,
        notes: &mut HashMap<NoteId, Note>,
        note_id: NoteId,
        from_category: CategoryId,
        to_category: CategoryId,
        target_index: usize,
    ) -> Result<usize, OrderingError> {
        let note = notes
            .get_mut(&note_id)
            .ok_or(OrderingError::NoteNotFound(note_id))?;
        if !self.has_lane(from_category) {
            return Err(OrderingError::CategoryNotFound(from_category));
        }
        if !self.has_lane(to_category) {
            return Err(OrderingError::CategoryNotFound(to_category));
        }
        let source_index = self
            .lane(from_category)
            .iter()
            .position(|id| *id == note_id)
            .filter(|_| note.category_id == from_category)
            .ok_or(OrderingError::NotInCategory {
                note_id,
                category_id: from_category,
            })?;

        if let Some(source) = self.lanes.get_mut(&from_category) {
            source.remove(source_index);
        }
        let destination = self.lanes.entry(to_category).or_default();
        let applied = target_index.min(destination.len());
        destination.insert(applied, note_id);
        note.category_id = to_category;

        debug!(
            "event=note_move module=ordering status=ok note_id={} from_category={} to_category={} index={}",
            note_id, from_category, to_category, applied
        );
        Ok(applied)
    }

    /// Replaces a lane order with a caller-proposed sequence.
    ///
    /// Accepted shapes:
    /// - a permutation of the full lane;
    /// - a permutation of the visible (non-archived) subset, in which case
    ///   archived notes keep their absolute slots.
    ///
    /// Returns whether the order changed.
    pub fn apply_sequence(
        &mut self,
        category_id: CategoryId,
        sequence: &[NoteId],
        notes: &HashMap<NoteId, Note>,
    ) -> Result<bool, OrderingError> {
        let lane = self
            .lanes
            .get_mut(&category_id)
            .ok_or(OrderingError::CategoryNotFound(category_id))?;

        let next = if is_permutation(sequence, lane.as_slice()) {
            sequence.to_vec()
        } else {
            let is_archived =
                |id: &NoteId| notes.get(id).map(|note| note.archived).unwrap_or(false);
            let visible: Vec<NoteId> = lane.iter().copied().filter(|id| !is_archived(id)).collect();
            if !is_permutation(sequence, &visible) {
                return Err(OrderingError::InvalidSequence {
                    category_id,
                    expected_len: lane.len(),
                    actual_len: sequence.len(),
                });
            }

            let mut proposed = sequence.iter().copied();
            lane.iter()
                .map(|id| {
                    if is_archived(id) {
                        *id
                    } else {
                        proposed.next().unwrap_or(*id)
                    }
                })
                .collect()
        };

        let changed = next != *lane;
        *lane = next;
        Ok(changed)
    }

    /// Verifies the exactly-once and `category_id` invariants against `notes`.
    pub fn is_consistent_with(&self, notes: &HashMap<NoteId, Note>) -> bool {
        let mut seen = HashSet::new();
        for (category_id, lane) in &self.lanes {
            for id in lane {
                if !seen.insert(*id) {
                    return false;
                }
                match notes.get(id) {
                    Some(note) if note.category_id == *category_id => {}
                    _ => return false,
                }
            }
        }
        seen.len() == notes.len()
    }
}

fn is_permutation(candidate: &[NoteId], current: &[NoteId]) -> bool {
    if candidate.len() != current.len() {
        return false;
    }
    let proposed: HashSet<NoteId> = candidate.iter().copied().collect();
    proposed.len() == candidate.len() && current.iter().all(|id| proposed.contains(id))
}

#[cfg(test)]
mod tests {
    use super::{reorder, NoteOrdering, OrderingError};
    use crate::model::note::Note;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn board_with(
        category_sizes: &[usize],
    ) -> (NoteOrdering, HashMap<Uuid, Note>, Vec<Uuid>) {
        let mut ordering = NoteOrdering::new();
        let mut notes = HashMap::new();
        let mut categories = Vec::new();
        for size in category_sizes {
            let category_id = Uuid::new_v4();
            ordering.add_lane(category_id);
            for index in 0..*size {
                let note = Note::new(category_id, format!("note {index}"));
                ordering
                    .insert(category_id, note.id, None)
                    .expect("insert note");
                notes.insert(note.id, note);
            }
            categories.push(category_id);
        }
        (ordering, notes, categories)
    }

    #[test]
    fn reorder_moves_item_forward_and_backward() {
        assert_eq!(reorder(&["a", "b", "c"], 1, 2), vec!["a", "c", "b"]);
        assert_eq!(reorder(&["a", "b", "c"], 2, 0), vec!["c", "a", "b"]);
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let items = ["a", "b", "c"];
        assert_eq!(reorder(&items, 3, 0), items.to_vec());
        assert_eq!(reorder(&items, 0, 7), items.to_vec());
        assert_eq!(reorder::<&str>(&[], 0, 0), Vec::<&str>::new());
    }

    #[test]
    fn insert_clamps_index_and_rejects_duplicates() {
        let (mut ordering, _, categories) = board_with(&[2]);
        let extra = Uuid::new_v4();
        let applied = ordering
            .insert(categories[0], extra, Some(99))
            .expect("clamped insert");
        assert_eq!(applied, 2);

        let err = ordering
            .insert(categories[0], extra, None)
            .expect_err("duplicate insert must fail");
        assert_eq!(err, OrderingError::DuplicateNote(extra));
    }

    #[test]
    fn move_across_updates_lane_and_category_reference() {
        let (mut ordering, mut notes, categories) = board_with(&[2, 2]);
        let moving = ordering.lane(categories[0])[1];

        let index = ordering
            .move_across(&mut notes, moving, categories[0], categories[1], 1)
            .expect("move");

        assert_eq!(index, 1);
        assert_eq!(ordering.lane(categories[0]).len(), 1);
        assert_eq!(ordering.lane(categories[1])[1], moving);
        assert_eq!(notes[&moving].category_id, categories[1]);
        assert!(ordering.is_consistent_with(&notes));
    }

    #[test]
    fn move_across_clamps_target_index() {
        let (mut ordering, mut notes, categories) = board_with(&[1, 3]);
        let moving = ordering.lane(categories[0])[0];

        let index = ordering
            .move_across(&mut notes, moving, categories[0], categories[1], usize::MAX)
            .expect("move");

        assert_eq!(index, 3);
        assert_eq!(ordering.lane(categories[1]).last(), Some(&moving));
    }

    #[test]
    fn move_across_with_wrong_source_leaves_state_untouched() {
        let (mut ordering, mut notes, categories) = board_with(&[1, 1]);
        let moving = ordering.lane(categories[0])[0];
        let before = ordering.clone();

        let err = ordering
            .move_across(&mut notes, moving, categories[1], categories[0], 0)
            .expect_err("wrong source must fail");

        assert!(matches!(err, OrderingError::NotInCategory { .. }));
        assert_eq!(ordering, before);
        assert_eq!(notes[&moving].category_id, categories[0]);
    }

    #[test]
    fn move_within_same_category_acts_as_reorder() {
        let (mut ordering, mut notes, categories) = board_with(&[3]);
        let lane = ordering.lane(categories[0]).to_vec();

        ordering
            .move_across(&mut notes, lane[0], categories[0], categories[0], 2)
            .expect("same-lane move");

        assert_eq!(ordering.lane(categories[0]), &[lane[1], lane[2], lane[0]]);
    }

    #[test]
    fn apply_sequence_accepts_visible_subset_and_keeps_archived_slot() {
        let (mut ordering, mut notes, categories) = board_with(&[3]);
        let lane = ordering.lane(categories[0]).to_vec();
        if let Some(note) = notes.get_mut(&lane[1]) {
            note.archived = true;
        }

        let changed = ordering
            .apply_sequence(categories[0], &[lane[2], lane[0]], &notes)
            .expect("visible subset");

        assert!(changed);
        assert_eq!(ordering.lane(categories[0]), &[lane[2], lane[1], lane[0]]);
    }

    #[test]
    fn apply_sequence_rejects_non_permutation() {
        let (mut ordering, notes, categories) = board_with(&[3]);
        let lane = ordering.lane(categories[0]).to_vec();

        let err = ordering
            .apply_sequence(categories[0], &[lane[0], lane[0], lane[1]], &notes)
            .expect_err("duplicate ids must fail");

        assert!(matches!(err, OrderingError::InvalidSequence { .. }));
        assert_eq!(ordering.lane(categories[0]), lane.as_slice());
    }
}
