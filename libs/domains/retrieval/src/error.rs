use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Unreadable input: {0}")]
    UnreadableInput(String),

    #[error("Arity mismatch: {vectors} vectors vs {payloads} payloads")]
    ArityMismatch { vectors: usize, payloads: usize },

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::BackendUnavailable(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for RetrievalError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        RetrievalError::BackendUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert RetrievalError to AppError for standardized HTTP error responses
impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::UnreadableInput(msg) => {
                AppError::UnprocessableEntity(format!("Unreadable input: {}", msg))
            }
            RetrievalError::ArityMismatch { vectors, payloads } => AppError::InternalServerError(
                format!("Arity mismatch: {} vectors vs {} payloads", vectors, payloads),
            ),
            RetrievalError::NotFound(id) => AppError::NotFound(format!("Item {} not found", id)),
            RetrievalError::DimensionMismatch { expected, actual } => {
                AppError::InternalServerError(format!(
                    "Dimension mismatch: expected {}, got {}",
                    expected, actual
                ))
            }
            RetrievalError::BackendUnavailable(msg) => AppError::ServiceUnavailable(msg),
            RetrievalError::Validation(msg) => AppError::BadRequest(msg),
            RetrievalError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            RetrievalError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RetrievalError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
