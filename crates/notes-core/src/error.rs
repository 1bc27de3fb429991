use thiserror::Error;

use crate::store::StoreError;

/// Failures a note operation can report to its caller.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("A note with id {0} already exists")]
    Conflict(String),

    #[error("No note with id {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for NoteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(id) => NoteError::Conflict(id),
            StoreError::NotFound(id) => NoteError::NotFound(id),
            StoreError::Backend(detail) => NoteError::Store(detail),
        }
    }
}
