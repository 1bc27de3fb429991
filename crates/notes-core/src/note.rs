//! Note entity and the shapes used to change it.

use serde::{Deserialize, Serialize};

use crate::error::NoteError;

/// Largest accepted note id, in bytes. Matches the DynamoDB partition key limit.
pub const MAX_ID_BYTES: usize = 2048;

/// A stored note. `id` is the partition key and never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Note {
    pub fn new(id: impl Into<String>, title: Option<String>, body: Option<String>) -> Self {
        Self {
            id: id.into(),
            title,
            body,
        }
    }

    /// Overwrite the fields named in `changes`, leaving the rest as they are.
    pub fn apply(&mut self, changes: &NoteChanges) {
        if let Some(title) = &changes.title {
            self.title = Some(title.clone());
        }
        if let Some(body) = &changes.body {
            self.body = Some(body.clone());
        }
    }
}

/// Fields named by an update request. Absent fields are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl NoteChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

/// One page of a scan over all notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Id to resume after. `None` once the scan is exhausted.
    pub next_cursor: Option<String>,
}

/// Check that `id` can be used as a partition key.
pub fn validate_id(id: &str) -> Result<(), NoteError> {
    if id.trim().is_empty() {
        return Err(NoteError::Validation("id must not be empty".to_string()));
    }
    if id.len() > MAX_ID_BYTES {
        return Err(NoteError::Validation(format!(
            "id must be at most {} bytes",
            MAX_ID_BYTES
        )));
    }
    Ok(())
}
