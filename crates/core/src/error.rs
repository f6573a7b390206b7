//! Error type shared by every collection operation.

use thiserror::Error;

use crate::models::EntryId;

/// Failures surfaced by the collection store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed input: empty title, out-of-range rating, negative playtime,
    /// unknown status value and similar.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The referenced entry does not exist.
    #[error("no game with id {0}")]
    NotFound(EntryId),
    /// Reading or writing the backing collection file failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error was caused by caller input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the error refers to an unknown entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias used by the store operations.
pub type StoreResult<T> = Result<T, StoreError>;
