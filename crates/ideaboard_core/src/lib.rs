//! Core domain logic for the idea board.
//! This crate is the single source of truth for board invariants.

pub mod assist;
pub mod board;
pub mod capability;
pub mod config;
pub mod db;
pub mod enrichment;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod persona;
pub mod repo;

pub use assist::{AssistError, AssistRequest, IdeaAssistant};
pub use board::{
    enrich_note, request_ideas, BoardController, BoardError, BoardResult, DeleteStep,
    EnrichmentOutcome,
};
pub use capability::{BoardCapability, CapabilitySet, NoteActions};
pub use config::{BoardConfig, BoardSettings, ConfigError};
pub use enrichment::fetcher::{FetchError, LinkPreviewFetcher};
pub use enrichment::PreviewRequest;
pub use lifecycle::LifecycleState;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::BoardState;
pub use model::category::{Category, CategoryField, CategoryId};
pub use model::note::{LinkData, Note, NoteId};
pub use ordering::drag::DragConflictPolicy;
pub use ordering::{reorder, OrderingError};
pub use repo::board_repo::{
    BoardRepository, InMemoryBoardRepository, RepoError, RepoResult, SqliteBoardRepository,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
