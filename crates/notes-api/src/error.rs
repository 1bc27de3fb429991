use axum::{
    Json,
    extract::rejection::{PathRejection, QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use notes_authorizer::AuthError;
use notes_core::NoteError;
use serde::Serialize;

/// Error body returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler-boundary error. Everything a route can fail with ends up here and
/// is converted to a response; nothing propagates further.
#[derive(Debug)]
pub enum ApiError {
    Note(NoteError),
    /// Request could not be read (path, query or event body)
    BadRequest(String),
    Unauthorized,
    Forbidden,
    Internal,
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        ApiError::Note(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) => ApiError::Unauthorized,
            AuthError::Config(reason) => {
                tracing::error!("Authorizer misconfigured: {}", reason);
                ApiError::Internal
            }
        }
    }
}

fn body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Note(NoteError::Validation(msg)) | ApiError::BadRequest(msg) => {
                body(StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Note(err @ NoteError::Conflict(_)) => {
                body(StatusCode::CONFLICT, err.to_string())
            }
            ApiError::Note(err @ NoteError::NotFound(_)) => {
                body(StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Note(NoteError::Store(detail)) => {
                // Store details stay in the logs
                tracing::error!(error = %detail, "Note storage failure");
                body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            ApiError::Unauthorized => {
                let mut response = body(StatusCode::UNAUTHORIZED, "Unauthorized");
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    header::HeaderValue::from_static("Bearer"),
                );
                response
            }
            ApiError::Forbidden => body(StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::Internal => {
                body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
