//! Note routes
//!
//! Bodies are handed to the note service as raw bytes so that malformed JSON
//! is reported the same way as any other validation failure.

use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use notes_core::{Note, NotePage};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

/// Fields echoed back after an update
#[derive(Debug, Serialize)]
pub struct UpdatedFields {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Handler for `POST /notes`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Bytes,
) -> Result<(StatusCode, Json<String>), ApiError> {
    tracing::debug!(principal = %caller.principal_id, "Creating note");
    let note = state.notes.create_note(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(format!("A new note has been created with id {}!", note.id)),
    ))
}

/// Handler for `PUT /notes/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<String>, PathRejection>,
    payload: Bytes,
) -> Result<(StatusCode, Json<UpdatedFields>), ApiError> {
    let Path(id) = path?;
    tracing::debug!(principal = %caller.principal_id, id = %id, "Updating note");
    let note = state.notes.update_note(&id, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UpdatedFields {
            title: note.title,
            body: note.body,
        }),
    ))
}

/// Handler for `DELETE /notes/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<String>, ApiError> {
    let Path(id) = path?;
    tracing::debug!(principal = %caller.principal_id, id = %id, "Deleting note");
    state.notes.delete_note(&id).await?;

    Ok(Json(format!(
        "The note with id: {} has been deleted successfully!",
        id
    )))
}

/// Handler for `GET /notes/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Note>, ApiError> {
    let Path(id) = path?;
    Ok(Json(state.notes.get_note(&id).await?))
}

/// Handler for `GET /notes`
pub async fn list(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<NotePage>, ApiError> {
    let Query(params) = query?;
    let page = state
        .notes
        .list_notes(params.limit, params.cursor.as_deref())
        .await?;
    Ok(Json(page))
}
