use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NoteStore, Result, StoreError};
use crate::note::{Note, NoteChanges, NotePage};

/// In-memory note store. Existence checks and writes happen under one lock,
/// so conditional operations are atomic just like the DynamoDB ones.
pub struct InMemoryStore {
    notes: RwLock<BTreeMap<String, Note>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for InMemoryStore {
    async fn create(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write().await;
        if notes.contains_key(&note.id) {
            return Err(StoreError::AlreadyExists(note.id.clone()));
        }
        notes.insert(note.id.clone(), note.clone());
        Ok(())
    }

    async fn update(&self, id: &str, changes: &NoteChanges) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = notes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        note.apply(changes);
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut notes = self.notes.write().await;
        notes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get(&self, id: &str) -> Result<Option<Note>> {
        let notes = self.notes.read().await;
        Ok(notes.get(id).cloned())
    }

    async fn list(&self, limit: usize, cursor: Option<&str>) -> Result<NotePage> {
        let notes = self.notes.read().await;
        let start = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut page: Vec<Note> = notes
            .range((start, Bound::Unbounded))
            .take(limit + 1)
            .map(|(_, note)| note.clone())
            .collect();

        let next_cursor = if page.len() > limit {
            page.truncate(limit);
            page.last().map(|note| note.id.clone())
        } else {
            None
        };

        Ok(NotePage {
            notes: page,
            next_cursor,
        })
    }
}
