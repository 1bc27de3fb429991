//! notes-core: the note model, the storage gateway and the note service.
//!
//! This crate provides:
//! - `Note` and the request shapes used to create and change one
//! - `NoteStore` trait with conditional create/update/delete semantics
//! - `InMemoryStore` for development and tests, `DynamoStore` for production
//! - `NoteService`, which validates input and maps store outcomes to `NoteError`

pub mod error;
pub mod note;
pub mod service;
pub mod store;

pub use error::NoteError;
pub use note::{Note, NoteChanges, NotePage, MAX_ID_BYTES};
pub use service::{NoteService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use store::{DynamoSettings, DynamoStore, InMemoryStore, NoteStore, StoreError};
