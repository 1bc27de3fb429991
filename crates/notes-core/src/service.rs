//! Note service: request validation on top of a `NoteStore`.
//!
//! The service is stateless. Each call parses its input, performs at most one
//! store round trip and reports the outcome as a `NoteError`.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::NoteError;
use crate::note::{validate_id, Note, NoteChanges, NotePage};
use crate::store::NoteStore;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

/// Body of a create request
#[derive(Debug, Deserialize)]
struct CreateNoteRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// Create a note from a JSON body `{id, title, body}`.
    pub async fn create_note(&self, payload: &[u8]) -> Result<Note, NoteError> {
        let request: CreateNoteRequest = parse(payload)?;
        let id = request
            .id
            .ok_or_else(|| NoteError::Validation("id is required".to_string()))?;
        validate_id(&id)?;

        let note = Note::new(id, request.title, request.body);
        self.store.create(&note).await?;

        info!(id = %note.id, "Note created");
        Ok(note)
    }

    /// Apply a JSON body `{title, body}` to the existing note `id`.
    ///
    /// Concurrent updates to the same note are last-writer-wins.
    pub async fn update_note(&self, id: &str, payload: &[u8]) -> Result<Note, NoteError> {
        validate_id(id)?;
        let changes: NoteChanges = parse(payload)?;
        if changes.is_empty() {
            return Err(NoteError::Validation(
                "at least one of title or body is required".to_string(),
            ));
        }

        let note = self.store.update(id, &changes).await?;

        info!(id = %note.id, "Note updated");
        Ok(note)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), NoteError> {
        validate_id(id)?;
        self.store.delete(id).await?;

        info!(id, "Note deleted");
        Ok(())
    }

    pub async fn get_note(&self, id: &str) -> Result<Note, NoteError> {
        validate_id(id)?;
        self.store
            .get(id)
            .await?
            .ok_or_else(|| NoteError::NotFound(id.to_string()))
    }

    /// List notes one page at a time. `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list_notes(
        &self,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> Result<NotePage, NoteError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.store.list(limit, cursor).await?;

        debug!(count = page.notes.len(), more = page.next_cursor.is_some(), "Listed notes");
        Ok(page)
    }
}

fn parse<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, NoteError> {
    serde_json::from_slice(payload)
        .map_err(|e| NoteError::Validation(format!("malformed JSON body: {}", e)))
}
