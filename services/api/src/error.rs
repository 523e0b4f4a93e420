//! Custom error types for the API service

use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use media::error::SignError;
use media::pipeline::{IngestError, ValidationError};
use media::staging::StagingError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unauthorized access
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Failed to sign video URL: {0}")]
    Sign(#[from] SignError),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// The multipart error behind a staging read failure, if any
fn multipart_cause(err: &std::io::Error) -> Option<&MultipartError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
}

fn ingest_response(err: IngestError) -> (StatusCode, String) {
    match err {
        IngestError::Validation(ValidationError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, "Video not found".to_string())
        }
        IngestError::Validation(ValidationError::NotOwner) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        }
        IngestError::Validation(e @ ValidationError::UnsupportedMediaType(_)) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        IngestError::Staging(e @ StagingError::TooLarge { .. }) => {
            (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
        }
        IngestError::Staging(StagingError::Io(io)) => match multipart_cause(&io) {
            Some(multipart) => (multipart.status(), multipart.body_text()),
            None => {
                error!(error = %io, "Failed to stage upload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Couldn't save uploaded file".to_string(),
                )
            }
        },
        other => {
            // Already logged with its stage by the pipeline
            let message = format!("Video processing failed during {}", other.stage());
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Database(e) => {
                error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Ingest(e) => ingest_response(e),
            ApiError::Sign(e) => {
                error!(error = %e, "Failed to sign video URL");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Couldn't generate video URL".to_string(),
                )
            }
            ApiError::Multipart(e) => (e.status(), e.body_text()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
