//! Gateway TOKEN authorizer endpoint
//!
//! Accepts the event an API gateway sends to a token authorizer and answers
//! with an access-policy document. An invalid token gets a 401 and no
//! document, which makes the gateway block the request itself. So does an
//! event that carries no token at all.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use notes_authorizer::AuthorizerResponse;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthorizerEvent {
    /// Always "TOKEN" for token authorizers
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub authorization_token: String,

    /// The protected resource being invoked
    #[serde(default)]
    pub method_arn: String,
}

/// Handler for `POST /authorize`
pub async fn handler(
    State(state): State<Arc<AppState>>,
    payload: Bytes,
) -> Result<Json<AuthorizerResponse>, ApiError> {
    let event: TokenAuthorizerEvent = serde_json::from_slice(&payload)
        .map_err(|e| ApiError::BadRequest(format!("malformed authorizer event: {}", e)))?;

    if let Some(kind) = event.kind.as_deref() {
        if kind != "TOKEN" {
            tracing::debug!(kind, "Unexpected authorizer event type");
        }
    }

    let decision = state
        .authorizer
        .authorize(&event.authorization_token, &event.method_arn)
        .await?;

    Ok(Json(decision.to_response()))
}
