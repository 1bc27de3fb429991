//! Gateway-style authorization for protected routes.
//!
//! Every request to a protected route is authorized before it reaches its
//! handler. The evaluated resource is `<resource_prefix>/<METHOD><path>`.
//! A missing or invalid credential is a 401, a Deny decision is a 403.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::error::ApiError;

/// The authorized caller, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principal_id: String,
    pub context: BTreeMap<String, String>,
}

pub async fn require_authorization(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = match request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str())
    {
        Some(Ok(value)) => value.to_string(),
        Some(Err(_)) => {
            tracing::debug!("Invalid Authorization header encoding");
            return ApiError::Unauthorized.into_response();
        }
        None => {
            tracing::debug!("No Authorization header present");
            return ApiError::Unauthorized.into_response();
        }
    };

    let resource = state.resource_for(request.method().as_str(), request.uri().path());
    let decision = match state.authorizer.authorize(&credential, &resource).await {
        Ok(decision) => decision,
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !decision.is_allowed() {
        return ApiError::Forbidden.into_response();
    }

    request.extensions_mut().insert(Caller {
        principal_id: decision.principal_id,
        context: decision.context,
    });
    next.run(request).await
}
