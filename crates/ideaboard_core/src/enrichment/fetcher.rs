//! Link preview fetcher contract.
//!
//! The fetcher is an external collaborator with no ordering contract of its
//! own. Core never retries on its behalf.

use crate::model::note::LinkData;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fetch failures reported by a preview collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Remote side could not be reached or answered with an error.
    Unavailable(String),
    /// Response arrived but carried no usable metadata.
    InvalidMetadata(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "link preview unavailable: {message}"),
            Self::InvalidMetadata(message) => {
                write!(f, "link preview metadata is invalid: {message}")
            }
        }
    }
}

impl Error for FetchError {}

/// Asynchronous URL metadata source.
///
/// Futures are not required to be `Send`: the board runs on one
/// cooperative event loop.
#[async_trait(?Send)]
pub trait LinkPreviewFetcher {
    async fn fetch(&self, url: &str) -> Result<LinkData, FetchError>;
}
