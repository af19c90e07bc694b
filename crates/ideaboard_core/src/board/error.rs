use crate::capability::BoardCapability;
use crate::lifecycle::LifecycleError;
use crate::model::category::{CategoryId, CategoryValidationError};
use crate::model::note::NoteId;
use crate::ordering::OrderingError;
use crate::repo::board_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BoardResult<T> = Result<T, BoardError>;

/// Controller error. The published snapshot is unchanged whenever one is
/// returned.
#[derive(Debug)]
pub enum BoardError {
    NoteNotFound(NoteId),
    CategoryNotFound(CategoryId),
    /// Operation is not offered in the current context.
    CapabilityDenied(BoardCapability),
    NotAwaitingConfirmation(NoteId),
    Ordering(OrderingError),
    InvalidCategory(CategoryValidationError),
    /// Loading the board failed. Saves never surface here.
    Repo(RepoError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::CapabilityDenied(capability) => {
                write!(f, "action not available here: {}", capability.as_str())
            }
            Self::NotAwaitingConfirmation(id) => {
                write!(f, "note is not awaiting delete confirmation: {id}")
            }
            Self::Ordering(err) => write!(f, "{err}"),
            Self::InvalidCategory(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ordering(err) => Some(err),
            Self::InvalidCategory(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NoteNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::CapabilityDenied(_)
            | Self::NotAwaitingConfirmation(_) => None,
        }
    }
}

impl From<OrderingError> for BoardError {
    fn from(value: OrderingError) -> Self {
        match value {
            OrderingError::NoteNotFound(id) => Self::NoteNotFound(id),
            OrderingError::CategoryNotFound(id) => Self::CategoryNotFound(id),
            other => Self::Ordering(other),
        }
    }
}

impl From<LifecycleError> for BoardError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::NotFound(id) => Self::NoteNotFound(id),
            LifecycleError::NotAwaitingConfirmation(id) => Self::NotAwaitingConfirmation(id),
        }
    }
}

impl From<CategoryValidationError> for BoardError {
    fn from(value: CategoryValidationError) -> Self {
        Self::InvalidCategory(value)
    }
}

impl From<RepoError> for BoardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
