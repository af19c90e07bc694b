//! Board controller: the single mutation surface for rendering.
//!
//! # Responsibility
//! - Own the canonical snapshot and every piece of ephemeral interaction
//!   state (delete confirmation, drag session, in-flight previews).
//! - Compose ordering, lifecycle and enrichment rules into board
//!   operations.
//! - Hand each accepted snapshot to the repository.
//!
//! # Invariants
//! - Every accepted mutation publishes a new `Arc<BoardState>` with a
//!   larger revision; rejected ones leave the published snapshot as is.
//! - Mutations are applied to a cloned draft, so a failure midway can
//!   never be observed.
//! - Persistence failures are logged and never fail an operation.
//! - No note text reaches the logs.

mod driver;
mod error;

pub use driver::{enrich_note, request_ideas};
pub use error::{BoardError, BoardResult};

use crate::assist::{normalize_suggestions, AssistRequest};
use crate::capability::{BoardCapability, CapabilitySet, NoteActions};
use crate::config::BoardSettings;
use crate::enrichment::fetcher::FetchError;
use crate::enrichment::{Completion, PreviewEnrichmentController, PreviewRequest};
use crate::lifecycle::{self, LifecycleState, NoteLifecycleManager};
use crate::model::board::BoardState;
use crate::model::category::{Category, CategoryField, CategoryId};
use crate::model::note::{LinkData, Note, NoteId};
use crate::ordering::drag::{resolve_drop, DragTracker, DropTarget};
use crate::persona::{default_categories, seed_categories, PersonaPreset};
use crate::repo::board_repo::BoardRepository;
use log::{debug, info, warn};
use std::sync::Arc;

/// Result of merging a preview fetch back into the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// `link_data` was set; carries the new snapshot.
    Applied(Arc<BoardState>),
    /// The note gained `link_data` from an explicit edit meanwhile.
    KeptExisting,
    /// The note was deleted or the request is no longer current.
    Discarded,
    /// The fetch failed; the note is left without `link_data`.
    Failed,
    /// No fetch was warranted.
    Skipped,
}

/// Step taken by [`BoardController::delete_note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStep {
    ConfirmationRequested,
    Deleted(Arc<BoardState>),
}

pub struct BoardController<R: BoardRepository> {
    repo: R,
    state: Arc<BoardState>,
    lifecycle: NoteLifecycleManager,
    enrichment: PreviewEnrichmentController,
    drag: DragTracker,
    capabilities: CapabilitySet,
    persona: Option<&'static PersonaPreset>,
    opened: Option<NoteId>,
}

impl<R: BoardRepository> BoardController<R> {
    /// Loads the stored board, or seeds a new one from the configured
    /// persona (a single inbox without one) and saves it.
    ///
    /// # Errors
    /// - `Repo` when the stored board cannot be read.
    pub fn open(repo: R, settings: BoardSettings) -> BoardResult<Self> {
        let (state, seeded) = match repo.load_board()? {
            Some(state) => (state, false),
            None => {
                let categories = match settings.persona {
                    Some(preset) => seed_categories(preset)?,
                    None => default_categories()?,
                };
                (BoardState::with_categories(categories), true)
            }
        };

        let controller = Self {
            repo,
            state: Arc::new(state),
            lifecycle: NoteLifecycleManager::new(),
            enrichment: PreviewEnrichmentController::new(),
            drag: DragTracker::new(settings.drag_conflict),
            capabilities: settings.capabilities,
            persona: settings.persona,
            opened: None,
        };
        if seeded {
            controller.persist("board_seed");
        }
        info!(
            "event=board_open module=board status=ok seeded={} persona={} categories={} notes={} revision={}",
            seeded,
            controller.persona.map_or("none", |preset| preset.kind),
            controller.state.categories().len(),
            controller.state.notes_len(),
            controller.state.revision()
        );
        Ok(controller)
    }

    /// Currently published snapshot.
    pub fn snapshot(&self) -> Arc<BoardState> {
        Arc::clone(&self.state)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Switches the rendering context, e.g. to the archived view.
    pub fn set_capabilities(&mut self, capabilities: CapabilitySet) {
        self.capabilities = capabilities;
    }

    pub fn persona(&self) -> Option<&'static PersonaPreset> {
        self.persona
    }

    pub fn lifecycle_state(&self, note_id: NoteId) -> LifecycleState {
        self.lifecycle.state(note_id)
    }

    pub fn opened_note(&self) -> Option<NoteId> {
        self.opened
    }

    pub fn active_drag(&self) -> Option<NoteId> {
        self.drag.active()
    }

    pub fn is_enrichment_in_flight(&self, note_id: NoteId) -> bool {
        self.enrichment.is_in_flight(note_id)
    }

    /// Appends an empty note to a category.
    pub fn add_note(&mut self, category_id: CategoryId) -> BoardResult<(Arc<BoardState>, NoteId)> {
        self.add_note_with_text(category_id, "")
    }

    pub fn add_note_with_text(
        &mut self,
        category_id: CategoryId,
        text: impl Into<String>,
    ) -> BoardResult<(Arc<BoardState>, NoteId)> {
        self.ensure_category(category_id)?;
        let note = Note::new(category_id, text);
        let note_id = note.id;

        let mut draft = self.draft();
        draft.insert_note(note, None)?;
        debug!(
            "event=note_add module=board status=ok note_id={} category_id={}",
            note_id, category_id
        );
        Ok((self.commit(draft, "note_add"), note_id))
    }

    /// Marks a note as the one under edit and returns its current value.
    ///
    /// Focus moving here reverts any other pending delete.
    pub fn open_note(&mut self, note_id: NoteId) -> BoardResult<Note> {
        let note = self.existing_note(note_id)?.clone();
        self.lifecycle.focus_moved_to(Some(note_id));
        self.opened = Some(note_id);
        Ok(note)
    }

    /// Stops editing the open note; a delete pending on it reverts.
    pub fn close_note(&mut self) -> Option<NoteId> {
        let closed = self.opened.take()?;
        let reverted = self
            .lifecycle
            .focus_lost(&self.state.notes, closed)
            .unwrap_or(false);
        debug!(
            "event=note_close module=board status=ok note_id={} delete_reverted={}",
            closed, reverted
        );
        Some(closed)
    }

    /// Full replace of a note's editable fields.
    ///
    /// `id` and `created_at` keep their stored values. A new `category_id`
    /// appends the note to that category. Changed flags need the matching
    /// capability.
    pub fn update_note(&mut self, note: Note) -> BoardResult<Arc<BoardState>> {
        let current = self.existing_note(note.id)?;
        if current.pinned != note.pinned {
            self.require(BoardCapability::Pin)?;
        }
        if current.archived != note.archived {
            self.require(BoardCapability::Archive)?;
        }
        let updated = Note {
            created_at: current.created_at,
            ..note
        };
        if updated == *current {
            return Ok(self.snapshot());
        }
        let from_category = current.category_id;
        let text_changed = current.text != updated.text;
        let note_id = updated.id;

        let mut draft = self.draft();
        if from_category != updated.category_id {
            draft.ordering.move_across(
                &mut draft.notes,
                note_id,
                from_category,
                updated.category_id,
                usize::MAX,
            )?;
        }
        draft.notes.insert(note_id, updated);

        if text_changed {
            self.enrichment.text_changed(note_id);
        }
        Ok(self.commit(draft, "note_update"))
    }

    /// Two-step delete: the first call asks for confirmation, the second
    /// removes the note.
    pub fn delete_note(&mut self, note_id: NoteId) -> BoardResult<DeleteStep> {
        match self.lifecycle.state(note_id) {
            LifecycleState::Normal => self
                .request_delete(note_id)
                .map(|_| DeleteStep::ConfirmationRequested),
            LifecycleState::ConfirmingDelete => {
                self.confirm_delete(note_id).map(DeleteStep::Deleted)
            }
        }
    }

    /// `Normal -> ConfirmingDelete`; the note itself is untouched.
    pub fn request_delete(&mut self, note_id: NoteId) -> BoardResult<LifecycleState> {
        self.require(BoardCapability::Delete)?;
        Ok(self.lifecycle.request_delete(&self.state.notes, note_id)?)
    }

    /// Removes a note pending confirmation, along with every piece of
    /// interaction state that refers to it.
    pub fn confirm_delete(&mut self, note_id: NoteId) -> BoardResult<Arc<BoardState>> {
        self.require(BoardCapability::Delete)?;
        self.lifecycle.confirm_delete(&self.state.notes, note_id)?;

        let mut draft = self.draft();
        draft.remove_note(note_id);
        self.enrichment.forget(note_id);
        if self.opened == Some(note_id) {
            self.opened = None;
        }
        if self.drag.active() == Some(note_id) {
            self.drag.cancel();
        }
        info!(
            "event=note_delete module=board status=ok note_id={}",
            note_id
        );
        Ok(self.commit(draft, "note_delete"))
    }

    pub fn cancel_delete(&mut self, note_id: NoteId) -> BoardResult<LifecycleState> {
        Ok(self.lifecycle.cancel_delete(&self.state.notes, note_id)?)
    }

    /// Pointer or focus left the note. Returns whether a pending delete
    /// was reverted.
    pub fn focus_lost(&mut self, note_id: NoteId) -> BoardResult<bool> {
        Ok(self.lifecycle.focus_lost(&self.state.notes, note_id)?)
    }

    pub fn toggle_pin(&mut self, note_id: NoteId) -> BoardResult<Arc<BoardState>> {
        self.require(BoardCapability::Pin)?;
        let mut draft = self.draft();
        let pinned = lifecycle::toggle_pin(note_in(&mut draft, note_id)?);
        debug!(
            "event=note_pin module=board status=ok note_id={} pinned={}",
            note_id, pinned
        );
        Ok(self.commit(draft, "note_pin"))
    }

    /// Hides a note from the primary view. It keeps its lane slot.
    pub fn archive_note(&mut self, note_id: NoteId) -> BoardResult<Arc<BoardState>> {
        self.set_archived(note_id, true)
    }

    pub fn unarchive_note(&mut self, note_id: NoteId) -> BoardResult<Arc<BoardState>> {
        self.set_archived(note_id, false)
    }

    fn set_archived(&mut self, note_id: NoteId, archived: bool) -> BoardResult<Arc<BoardState>> {
        self.require(BoardCapability::Archive)?;
        let mut draft = self.draft();
        if !lifecycle::set_archived(note_in(&mut draft, note_id)?, archived) {
            return Ok(self.snapshot());
        }
        debug!(
            "event=note_archive module=board status=ok note_id={} archived={}",
            note_id, archived
        );
        Ok(self.commit(draft, "note_archive"))
    }

    /// Accepts a new lane order when it is a permutation of the lane or of
    /// its visible notes.
    pub fn reorder_notes(
        &mut self,
        category_id: CategoryId,
        sequence: &[NoteId],
    ) -> BoardResult<Arc<BoardState>> {
        let mut draft = self.draft();
        if !draft
            .ordering
            .apply_sequence(category_id, sequence, &draft.notes)?
        {
            return Ok(self.snapshot());
        }
        Ok(self.commit(draft, "note_reorder"))
    }

    /// Moves a note into `to_category` at `target_index`.
    ///
    /// `target_index` counts the destination's visible notes, the list the
    /// board renders; archived notes keep their slots. Indices past the end
    /// append.
    pub fn move_note(
        &mut self,
        note_id: NoteId,
        to_category: CategoryId,
        target_index: usize,
    ) -> BoardResult<Arc<BoardState>> {
        let (from_category, _) = self
            .state
            .position(note_id)
            .ok_or(BoardError::NoteNotFound(note_id))?;
        let slot = self.state.view_slot(to_category, note_id, target_index);
        let mut draft = self.draft();
        draft.ordering.move_across(
            &mut draft.notes,
            note_id,
            from_category,
            to_category,
            slot,
        )?;
        if draft == *self.state {
            return Ok(self.snapshot());
        }
        Ok(self.commit(draft, "note_move"))
    }

    /// Begins a drag session and returns the captured note.
    ///
    /// Picking up a note reverts any other pending delete.
    pub fn drag_start(&mut self, note_id: NoteId) -> BoardResult<Note> {
        let note = self.existing_note(note_id)?.clone();
        self.drag.start(note_id)?;
        self.lifecycle.focus_moved_to(Some(note_id));
        Ok(note)
    }

    /// Ends the session owned by `active_id`, dropping over `over_id`.
    ///
    /// No target, or the note itself, ends the session without a change.
    pub fn drag_end(
        &mut self,
        active_id: NoteId,
        over_id: Option<NoteId>,
    ) -> BoardResult<Arc<BoardState>> {
        self.drag.finish(active_id)?;
        let target = resolve_drop(&self.state.ordering, active_id, over_id)?;
        match target {
            DropTarget::Nothing => Ok(self.snapshot()),
            DropTarget::Reorder {
                category_id,
                from,
                to,
            } => {
                let mut draft = self.draft();
                if !draft.ordering.reorder_lane(category_id, from, to)? {
                    return Ok(self.snapshot());
                }
                Ok(self.commit(draft, "note_reorder"))
            }
            DropTarget::Move {
                from_category,
                to_category,
                index,
            } => {
                let mut draft = self.draft();
                draft.ordering.move_across(
                    &mut draft.notes,
                    active_id,
                    from_category,
                    to_category,
                    index,
                )?;
                Ok(self.commit(draft, "note_move"))
            }
        }
    }

    /// Ends any drag session without a change.
    pub fn drag_cancel(&mut self) -> Option<NoteId> {
        self.drag.cancel()
    }

    pub fn update_category(
        &mut self,
        category_id: CategoryId,
        field: CategoryField,
        value: &str,
    ) -> BoardResult<Arc<BoardState>> {
        let mut draft = self.draft();
        draft
            .categories
            .iter_mut()
            .find(|category| category.id == category_id)
            .ok_or(BoardError::CategoryNotFound(category_id))?
            .set_field(field, value)?;
        debug!(
            "event=category_update module=board status=ok category_id={} field={}",
            category_id,
            field.as_str()
        );
        Ok(self.commit(draft, "category_update"))
    }

    /// Appends a new, empty category.
    pub fn add_category(
        &mut self,
        title: &str,
        icon: &str,
        color: &str,
    ) -> BoardResult<(Arc<BoardState>, CategoryId)> {
        let category = Category::try_new(title, icon, color)?;
        let category_id = category.id;
        let mut draft = self.draft();
        draft.add_category(category);
        Ok((self.commit(draft, "category_add"), category_id))
    }

    /// Starts a preview fetch for one note when one is warranted.
    pub fn begin_enrichment(&mut self, note_id: NoteId) -> BoardResult<Option<PreviewRequest>> {
        let note = self
            .state
            .note(note_id)
            .ok_or(BoardError::NoteNotFound(note_id))?;
        Ok(self.enrichment.evaluate(note))
    }

    /// Allows another attempt for unchanged text, then evaluates the note.
    pub fn retry_enrichment(&mut self, note_id: NoteId) -> BoardResult<Option<PreviewRequest>> {
        self.existing_note(note_id)?;
        self.enrichment.retry(note_id);
        self.begin_enrichment(note_id)
    }

    /// Evaluates every note, in board order.
    pub fn collect_enrichment_requests(&mut self) -> Vec<PreviewRequest> {
        let state = Arc::clone(&self.state);
        state
            .categories()
            .iter()
            .flat_map(|category| state.lane_notes(category.id))
            .filter_map(|note| self.enrichment.evaluate(note))
            .collect()
    }

    /// Merges a fetch result into the note's current state.
    ///
    /// Applied even if the text changed since the fetch began, but never
    /// over `link_data` already present, and never to a deleted note.
    pub fn apply_preview(
        &mut self,
        request: &PreviewRequest,
        result: Result<LinkData, FetchError>,
    ) -> EnrichmentOutcome {
        let data = match self.enrichment.complete(request, result) {
            Completion::Ready(data) => data,
            Completion::Failed(_) => return EnrichmentOutcome::Failed,
            Completion::Stale => return EnrichmentOutcome::Discarded,
        };

        let note_id = request.note_id();
        match self.state.note(note_id).map(|note| note.link_data.is_some()) {
            None => {
                debug!(
                    "event=preview_merge module=board status=discarded reason=note_missing note_id={}",
                    note_id
                );
                EnrichmentOutcome::Discarded
            }
            Some(true) => {
                debug!(
                    "event=preview_merge module=board status=skipped reason=link_data_present note_id={}",
                    note_id
                );
                EnrichmentOutcome::KeptExisting
            }
            Some(false) => {
                let mut draft = self.draft();
                if let Some(note) = draft.notes.get_mut(&note_id) {
                    note.link_data = Some(data);
                }
                EnrichmentOutcome::Applied(self.commit(draft, "preview_merge"))
            }
        }
    }

    /// Builds the assistant input for one category.
    pub fn assist_request(&self, category_id: CategoryId) -> BoardResult<AssistRequest> {
        let category = self
            .state
            .category(category_id)
            .ok_or(BoardError::CategoryNotFound(category_id))?;
        Ok(AssistRequest {
            category_id,
            persona_context: self.persona.map(|preset| preset.context.to_string()),
            category_title: category.title.clone(),
            existing_ideas: self
                .state
                .active_notes(category_id)
                .into_iter()
                .map(|note| note.text.clone())
                .collect(),
        })
    }

    /// Turns assistant suggestions into notes appended to the category.
    ///
    /// Returns the ids of the notes created; blanks and repeats are dropped.
    pub fn accept_suggestions(
        &mut self,
        category_id: CategoryId,
        ideas: &[String],
    ) -> BoardResult<(Arc<BoardState>, Vec<NoteId>)> {
        self.ensure_category(category_id)?;
        let existing: Vec<String> = self
            .state
            .lane_notes(category_id)
            .into_iter()
            .map(|note| note.text.clone())
            .collect();
        let accepted = normalize_suggestions(ideas, &existing);
        if accepted.is_empty() {
            return Ok((self.snapshot(), Vec::new()));
        }

        let mut draft = self.draft();
        let mut created = Vec::with_capacity(accepted.len());
        for text in accepted {
            let note = Note::new(category_id, text);
            created.push(note.id);
            draft.insert_note(note, None)?;
        }
        info!(
            "event=assist_accept module=board status=ok category_id={} offered={} accepted={}",
            category_id,
            ideas.len(),
            created.len()
        );
        Ok((self.commit(draft, "assist_accept"), created))
    }

    /// Actions rendering may offer for a note in the current context.
    pub fn note_actions(&self, note_id: NoteId) -> BoardResult<NoteActions> {
        let note = self.existing_note(note_id)?;
        Ok(self
            .capabilities
            .actions_for(note, self.lifecycle.state(note_id)))
    }

    fn require(&self, capability: BoardCapability) -> BoardResult<()> {
        if self.capabilities.allows(capability) {
            return Ok(());
        }
        debug!(
            "event=capability_check module=board status=denied capability={}",
            capability.as_str()
        );
        Err(BoardError::CapabilityDenied(capability))
    }

    fn existing_note(&self, note_id: NoteId) -> BoardResult<&Note> {
        self.state
            .note(note_id)
            .ok_or(BoardError::NoteNotFound(note_id))
    }

    fn ensure_category(&self, category_id: CategoryId) -> BoardResult<()> {
        match self.state.category(category_id) {
            Some(_) => Ok(()),
            None => Err(BoardError::CategoryNotFound(category_id)),
        }
    }

    fn draft(&self) -> BoardState {
        (*self.state).clone()
    }

    fn commit(&mut self, mut draft: BoardState, event: &'static str) -> Arc<BoardState> {
        draft.revision = self.state.revision() + 1;
        self.state = Arc::new(draft);
        self.persist(event);
        debug_assert!(self.state.check_consistency());
        Arc::clone(&self.state)
    }

    fn persist(&self, trigger: &'static str) {
        if let Err(err) = self.repo.save_board(&self.state) {
            warn!(
                "event=board_save module=board status=error trigger={} revision={} error={}",
                trigger,
                self.state.revision(),
                err
            );
        }
    }
}

fn note_in(draft: &mut BoardState, note_id: NoteId) -> BoardResult<&mut Note> {
    draft
        .notes
        .get_mut(&note_id)
        .ok_or(BoardError::NoteNotFound(note_id))
}
