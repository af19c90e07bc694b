//! AI idea assistant hand-off.
//!
//! # Responsibility
//! - Describe what the assistant receives and returns.
//! - Normalize raw suggestions before they become notes.
//!
//! # Invariants
//! - The core never generates text itself.
//! - Blank and duplicate suggestions never become notes.

use crate::model::category::CategoryId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound of suggestions accepted from one assist round.
pub const MAX_SUGGESTIONS: usize = 10;

/// Input for one assist round, scoped to a single category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistRequest {
    pub category_id: CategoryId,
    /// Persona description, when the board was seeded from one.
    pub persona_context: Option<String>,
    pub category_title: String,
    /// Texts of the category's active notes, in board order.
    pub existing_ideas: Vec<String>,
}

/// Assistant failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistError {
    Unavailable(String),
    InvalidResponse(String),
}

impl Display for AssistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "idea assistant unavailable: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "idea assistant returned an invalid response: {message}")
            }
        }
    }
}

impl Error for AssistError {}

/// Asynchronous idea generator.
#[async_trait(?Send)]
pub trait IdeaAssistant {
    async fn suggest(&self, request: &AssistRequest) -> Result<Vec<String>, AssistError>;
}

/// Trims suggestions, drops blanks and repeats, caps the count.
///
/// Ideas already on the board (`existing`) are treated as repeats.
pub fn normalize_suggestions(suggestions: &[String], existing: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|idea| idea.trim().to_lowercase())
        .collect();
    suggestions
        .iter()
        .map(|idea| idea.trim())
        .filter(|idea| !idea.is_empty())
        .filter(|idea| seen.insert(idea.to_lowercase()))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
