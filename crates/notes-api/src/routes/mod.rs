pub mod authorize;
pub mod notes;

/// Handler for `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
