//! Storage gateway for notes.
//!
//! Implementations:
//! - `InMemoryStore` - process-local map, for development and tests
//! - `DynamoStore` - single DynamoDB table keyed by note id
//!
//! Every operation is one round trip and atomic for a single record.
//! Preconditions on record existence are enforced by the backend, never by a
//! read followed by a write.

mod dynamo;
mod memory;

pub use dynamo::{DynamoSettings, DynamoStore};
pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::note::{Note, NoteChanges, NotePage};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert `note` only if no note with the same id exists.
    async fn create(&self, note: &Note) -> Result<()>;

    /// Set the fields named in `changes` only if a note with `id` exists.
    /// Returns the note as stored after the update.
    async fn update(&self, id: &str, changes: &NoteChanges) -> Result<Note>;

    /// Remove the note with `id` only if it exists.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Read a single note
    async fn get(&self, id: &str) -> Result<Option<Note>>;

    /// Scan up to `limit` notes, starting after `cursor` when given.
    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<NotePage>;
}
