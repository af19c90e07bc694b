//! Async drivers for the board's two suspension points.
//!
//! The board is borrowed only before and after the awaited collaborator
//! call, so other operations can run while a fetch or assist is pending.

use super::{BoardController, BoardResult, EnrichmentOutcome};
use crate::assist::IdeaAssistant;
use crate::enrichment::fetcher::LinkPreviewFetcher;
use crate::model::category::CategoryId;
use crate::model::note::NoteId;
use crate::repo::board_repo::BoardRepository;
use log::debug;
use std::cell::RefCell;

/// Fetches and merges a link preview for one note.
///
/// Returns `Skipped` when no fetch is warranted. Fetch failures are
/// absorbed into `Failed`.
pub async fn enrich_note<R, F>(
    board: &RefCell<BoardController<R>>,
    fetcher: &F,
    note_id: NoteId,
) -> BoardResult<EnrichmentOutcome>
where
    R: BoardRepository,
    F: LinkPreviewFetcher + ?Sized,
{
    let request = board.borrow_mut().begin_enrichment(note_id)?;
    let Some(request) = request else {
        return Ok(EnrichmentOutcome::Skipped);
    };

    let result = fetcher.fetch(request.url()).await;
    Ok(board.borrow_mut().apply_preview(&request, result))
}

/// Asks the assistant for ideas and appends them to a category.
///
/// Returns the ids of the created notes. An assistant failure yields an
/// empty list.
pub async fn request_ideas<R, A>(
    board: &RefCell<BoardController<R>>,
    assistant: &A,
    category_id: CategoryId,
) -> BoardResult<Vec<NoteId>>
where
    R: BoardRepository,
    A: IdeaAssistant + ?Sized,
{
    let request = board.borrow().assist_request(category_id)?;
    debug!(
        "event=assist_request module=board status=start category_id={} existing={}",
        category_id,
        request.existing_ideas.len()
    );

    let ideas = match assistant.suggest(&request).await {
        Ok(ideas) => ideas,
        Err(err) => {
            debug!(
                "event=assist_request module=board status=error category_id={} error={}",
                category_id, err
            );
            return Ok(Vec::new());
        }
    };

    let (_, created) = board
        .borrow_mut()
        .accept_suggestions(category_id, &ideas)?;
    Ok(created)
}
