//! Link preview enrichment controller.
//!
//! # Responsibility
//! - Decide when a note's text warrants a preview fetch.
//! - Track in-flight fetches and per-content attempts.
//! - Turn fetch completions into merge-ready payloads.
//!
//! # Invariants
//! - At most one fetch is in flight per note.
//! - At most one attempt is made per distinct note text; the marker is
//!   cleared only by a text change or an explicit retry.
//! - A completion whose request is no longer current yields nothing.
//! - Failures are absorbed here and never surface to the user.

pub mod fetcher;
pub mod url;

use self::fetcher::FetchError;
use self::url::{first_url, url_host};
use crate::model::note::{LinkData, Note, NoteId};
use log::{debug, info};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Identity of one fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// Fetch work handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRequest {
    ticket: FetchTicket,
    note_id: NoteId,
    url: String,
}

impl PreviewRequest {
    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    pub fn note_id(&self) -> NoteId {
        self.note_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Result of completing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Metadata ready to merge into the note.
    Ready(LinkData),
    /// Fetch failed; nothing to merge.
    Failed(FetchError),
    /// Request is no longer tracked (note removed or forgotten).
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: FetchTicket,
}

/// Per-note enrichment bookkeeping.
#[derive(Debug, Default)]
pub struct PreviewEnrichmentController {
    next_ticket: u64,
    in_flight: HashMap<NoteId, InFlight>,
    attempted: HashMap<NoteId, u64>,
}

impl PreviewEnrichmentController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fetch for `note` when one is warranted.
    ///
    /// Conditions: no `link_data`, text holds a URL, nothing in flight for
    /// the note, and no earlier attempt for this exact text.
    pub fn evaluate(&mut self, note: &Note) -> Option<PreviewRequest> {
        if note.link_data.is_some() || self.in_flight.contains_key(&note.id) {
            return None;
        }
        let url = first_url(&note.text)?;
        let text_hash = hash_text(&note.text);
        if self.attempted.get(&note.id) == Some(&text_hash) {
            return None;
        }

        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        self.in_flight.insert(note.id, InFlight { ticket });
        self.attempted.insert(note.id, text_hash);
        info!(
            "event=preview_fetch module=enrichment status=start note_id={} host={}",
            note.id,
            url_host(url).unwrap_or("unknown")
        );

        Some(PreviewRequest {
            ticket,
            note_id: note.id,
            url: url.to_string(),
        })
    }

    pub fn is_in_flight(&self, note_id: NoteId) -> bool {
        self.in_flight.contains_key(&note_id)
    }

    /// Note text changed; a new attempt becomes possible.
    pub fn text_changed(&mut self, note_id: NoteId) {
        self.attempted.remove(&note_id);
    }

    /// Allows one more attempt for unchanged text.
    pub fn retry(&mut self, note_id: NoteId) {
        self.attempted.remove(&note_id);
    }

    /// Drops all bookkeeping for a removed note.
    ///
    /// A pending completion for it becomes [`Completion::Stale`].
    pub fn forget(&mut self, note_id: NoteId) {
        self.in_flight.remove(&note_id);
        self.attempted.remove(&note_id);
    }

    /// Settles a request with the fetcher's result.
    pub fn complete(
        &mut self,
        request: &PreviewRequest,
        result: Result<LinkData, FetchError>,
    ) -> Completion {
        let current = self
            .in_flight
            .get(&request.note_id)
            .is_some_and(|in_flight| in_flight.ticket == request.ticket);
        if !current {
            debug!(
                "event=preview_fetch module=enrichment status=stale note_id={}",
                request.note_id
            );
            return Completion::Stale;
        }
        self.in_flight.remove(&request.note_id);

        match result {
            Ok(mut data) => {
                if data.url.trim().is_empty() {
                    data.url = request.url.clone();
                }
                info!(
                    "event=preview_fetch module=enrichment status=ok note_id={}",
                    request.note_id
                );
                Completion::Ready(data)
            }
            Err(err) => {
                debug!(
                    "event=preview_fetch module=enrichment status=error note_id={} error={}",
                    request.note_id, err
                );
                Completion::Failed(err)
            }
        }
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
