use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service::StorageError;
use thiserror::Error;
use tracing::error;

pub const KEY_NOT_FOUND: &str = "key not found";

/// Errors surfaced by the record handlers. Bodies are plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("key not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::NotFound,
            StorageError::InvalidKey(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, KEY_NOT_FOUND).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Storage(e) => {
                error!(error = %e, "storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal storage error").into_response()
            }
        }
    }
}
