//! notes-api library: router, shared state and configuration.
//!
//! The binary in `main.rs` only parses arguments, loads configuration and
//! serves the router built here, so integration tests can drive the same
//! router in-process.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use notes_authorizer::Authorizer;
use notes_core::{DynamoStore, InMemoryStore, NoteService, NoteStore};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ConfigError, StorageBackend};

/// Shared application state
pub struct AppState {
    pub notes: NoteService,
    pub authorizer: Authorizer,
    pub resource_prefix: String,
}

impl AppState {
    pub fn new(notes: NoteService, authorizer: Authorizer, resource_prefix: String) -> Self {
        Self {
            notes,
            authorizer,
            resource_prefix: resource_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Build every component from a validated configuration.
    pub async fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let store: Arc<dyn NoteStore> = match config.storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory note store; notes are lost on restart");
                Arc::new(InMemoryStore::new())
            }
            StorageBackend::Dynamodb => {
                Arc::new(DynamoStore::connect(&config.storage.dynamo_settings()?).await)
            }
        };

        let authorizer = config
            .auth
            .authorizer
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        tracing::info!(strategy = authorizer.strategy(), "Authorizer ready");

        Ok(Self::new(
            NoteService::new(store),
            authorizer,
            config.auth.resource_prefix.clone(),
        ))
    }

    /// Resource identifier evaluated for a request, shaped like a gateway method ARN.
    pub fn resource_for(&self, method: &str, path: &str) -> String {
        format!("{}/{}{}", self.resource_prefix, method, path)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route(
            "/notes",
            get(routes::notes::list).post(routes::notes::create),
        )
        .route(
            "/notes/{id}",
            get(routes::notes::get)
                .put(routes::notes::update)
                .delete(routes::notes::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_authorization,
        ));

    Router::new()
        .merge(protected)
        // Gateway token authorizer
        .route("/authorize", post(routes::authorize::handler))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
