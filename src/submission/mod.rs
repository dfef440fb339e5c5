pub mod files;
pub mod listing;
pub mod parser;
pub mod pipeline;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::ValidationError;

/// Everything that can go wrong while handling `POST /api/submit`.
#[derive(Debug)]
pub enum SubmitError {
    Validation(ValidationError),
    PayloadTooLarge(String),
    BodyTooLarge(u64),
    TooManyFiles(usize),
    Malformed(String),
    Io(std::io::Error),
    Database(sqlx::Error),
}

impl SubmitError {
    pub fn from_multer(err: multer::Error) -> Self {
        match &err {
            multer::Error::FieldSizeExceeded { .. } | multer::Error::StreamSizeExceeded { .. } => {
                SubmitError::PayloadTooLarge(err.to_string())
            }
            _ => SubmitError::Malformed(err.to_string()),
        }
    }
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Validation(err) => write!(f, "Validation failed: {err}"),
            SubmitError::PayloadTooLarge(msg) => write!(f, "Payload too large: {msg}"),
            SubmitError::BodyTooLarge(length) => write!(f, "Body too large: {length} bytes"),
            SubmitError::TooManyFiles(max) => write!(f, "Too many files: at most {max} allowed"),
            SubmitError::Malformed(msg) => write!(f, "Malformed form: {msg}"),
            SubmitError::Io(err) => write!(f, "Upload write failed: {err}"),
            SubmitError::Database(err) => write!(f, "Database Error: {err}"),
        }
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SubmitError::PayloadTooLarge(_) => {
                tracing::warn!("Rejected submission: {self}");
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
            }
            SubmitError::BodyTooLarge(_) => {
                tracing::warn!("Rejected submission: {self}");
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
            }
            SubmitError::TooManyFiles(_) => {
                tracing::warn!("Rejected submission: {self}");
                (StatusCode::PAYLOAD_TOO_LARGE, "Too many files")
            }
            SubmitError::Malformed(_) => {
                tracing::warn!("Rejected submission: {self}");
                (StatusCode::BAD_REQUEST, "Invalid multipart form data")
            }
            SubmitError::Validation(_) => {
                tracing::warn!("Submission failed: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit data")
            }
            SubmitError::Io(_) | SubmitError::Database(_) => {
                tracing::error!("Submission failed: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit data")
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        SubmitError::Validation(err)
    }
}

impl From<std::io::Error> for SubmitError {
    fn from(err: std::io::Error) -> Self {
        SubmitError::Io(err)
    }
}

impl From<sqlx::Error> for SubmitError {
    fn from(err: sqlx::Error) -> Self {
        SubmitError::Database(err)
    }
}
