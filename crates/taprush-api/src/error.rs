use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Request-scoped failures. Every variant maps to one status code; nothing
/// here is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("admin access required")]
    Forbidden,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(m) => (StatusCode::NOT_FOUND, *m),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, *m),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid credentials"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "admin access required"),
            Self::Internal(e) => {
                // Log the detail, never leak it to the client.
                error!("internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
