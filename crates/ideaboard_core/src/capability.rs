//! Per-context action capabilities.
//!
//! # Responsibility
//! - Declare which note actions a rendering context offers.
//! - Parse capability declarations from configuration strings.
//!
//! # Invariants
//! - Operations outside the active set are denied before any mutation.
//! - Pin is never offered for archived notes.

use crate::lifecycle::LifecycleState;
use crate::model::note::Note;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action family gated per rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BoardCapability {
    Pin,
    Archive,
    Delete,
}

impl BoardCapability {
    /// Stable string id used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => CAPABILITY_PIN,
            Self::Archive => CAPABILITY_ARCHIVE,
            Self::Delete => CAPABILITY_DELETE,
        }
    }
}

/// Configuration string value for pin capability.
pub const CAPABILITY_PIN: &str = "pin";
/// Configuration string value for archive capability.
pub const CAPABILITY_ARCHIVE: &str = "archive";
/// Configuration string value for delete capability.
pub const CAPABILITY_DELETE: &str = "delete";

const SUPPORTED_CAPABILITY_STRINGS: &[&str] =
    &[CAPABILITY_PIN, CAPABILITY_ARCHIVE, CAPABILITY_DELETE];

/// Returns supported capability declaration strings.
pub fn supported_capability_strings() -> &'static [&'static str] {
    SUPPORTED_CAPABILITY_STRINGS
}

/// Parses one capability from its configuration string.
pub fn parse_capability(value: &str) -> Result<BoardCapability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }

    match normalized {
        CAPABILITY_PIN => Ok(BoardCapability::Pin),
        CAPABILITY_ARCHIVE => Ok(BoardCapability::Archive),
        CAPABILITY_DELETE => Ok(BoardCapability::Delete),
        other => Err(CapabilityError::UnsupportedCapability(other.to_string())),
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "capability value must not be empty"),
            Self::UnsupportedCapability(value) => {
                write!(f, "capability is unsupported: {value}")
            }
        }
    }
}

impl Error for CapabilityError {}

/// Explicit set of actions a context offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    allowed: BTreeSet<BoardCapability>,
}

impl CapabilitySet {
    /// Primary board view: every action.
    pub fn board() -> Self {
        Self::from_iter([
            BoardCapability::Pin,
            BoardCapability::Archive,
            BoardCapability::Delete,
        ])
    }

    /// Archived view: restore and delete, no pinning.
    pub fn archive_view() -> Self {
        Self::from_iter([BoardCapability::Archive, BoardCapability::Delete])
    }

    pub fn read_only() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }

    /// Parses a declaration list. Duplicates collapse.
    pub fn parse<S: AsRef<str>>(values: &[S]) -> Result<Self, CapabilityError> {
        values
            .iter()
            .map(|value| parse_capability(value.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(|allowed| Self { allowed })
    }

    pub fn allows(&self, capability: BoardCapability) -> bool {
        self.allowed.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = BoardCapability> + '_ {
        self.allowed.iter().copied()
    }

    /// Actions to offer for `note` in this context.
    pub fn actions_for(&self, note: &Note, state: LifecycleState) -> NoteActions {
        let confirming = state == LifecycleState::ConfirmingDelete;
        NoteActions {
            pin: self.allows(BoardCapability::Pin) && !note.archived && !note.pinned,
            unpin: self.allows(BoardCapability::Pin) && !note.archived && note.pinned,
            archive: self.allows(BoardCapability::Archive) && !note.archived,
            unarchive: self.allows(BoardCapability::Archive) && note.archived,
            delete: self.allows(BoardCapability::Delete) && !confirming,
            confirm_delete: self.allows(BoardCapability::Delete) && confirming,
        }
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::board()
    }
}

impl FromIterator<BoardCapability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = BoardCapability>>(iter: I) -> Self {
        Self {
            allowed: iter.into_iter().collect(),
        }
    }
}

/// Action availability for one note, consumed by rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteActions {
    pub pin: bool,
    pub unpin: bool,
    pub archive: bool,
    pub unarchive: bool,
    pub delete: bool,
    pub confirm_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::{
        parse_capability, supported_capability_strings, BoardCapability, CapabilityError,
        CapabilitySet,
    };
    use crate::lifecycle::LifecycleState;
    use crate::model::note::Note;
    use uuid::Uuid;

    #[test]
    fn parses_all_supported_capabilities() {
        for value in supported_capability_strings() {
            let parsed = parse_capability(value).expect("supported capability parses");
            assert_eq!(parsed.as_str(), *value);
        }
    }

    #[test]
    fn rejects_empty_and_unknown_capabilities() {
        assert_eq!(
            parse_capability("  "),
            Err(CapabilityError::EmptyCapability)
        );
        assert_eq!(
            parse_capability("Pin"),
            Err(CapabilityError::UnsupportedCapability("Pin".to_string()))
        );
    }

    #[test]
    fn parse_collapses_duplicates() {
        let set = CapabilitySet::parse(&["pin", "pin", "delete"]).expect("valid list");
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![BoardCapability::Pin, BoardCapability::Delete]
        );
    }

    #[test]
    fn archived_notes_never_offer_pin() {
        let mut note = Note::new(Uuid::new_v4(), "idea");
        note.archived = true;
        let actions = CapabilitySet::board().actions_for(&note, LifecycleState::Normal);
        assert!(!actions.pin);
        assert!(!actions.unpin);
        assert!(actions.unarchive);
    }

    #[test]
    fn confirming_delete_swaps_delete_for_confirm() {
        let note = Note::new(Uuid::new_v4(), "idea");
        let actions =
            CapabilitySet::archive_view().actions_for(&note, LifecycleState::ConfirmingDelete);
        assert!(!actions.delete);
        assert!(actions.confirm_delete);
        assert!(!actions.pin);
    }
}
