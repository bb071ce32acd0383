//! Error types for the OCR server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::accounts::StoreError;
use crate::auth::AuthError;
use crate::document::DocumentError;
use crate::upload::{ExtractionError, UploadError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => AppError::Conflict("User already exists".to_string()),
            StoreError::InvalidCredentials => AppError::Auth(AuthError::InvalidCredentials),
            other => AppError::Store(other),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// Status, error code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, "conflict", msg.clone()),
            AppError::Upload(e) => (e.status_code(), e.code(), e.to_string()),
            AppError::Auth(AuthError::Signing(e)) => {
                tracing::error!("Token signing error: {}", e);
                internal()
            }
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
            AppError::Extraction(ExtractionError::Document(e)) => match e {
                DocumentError::IoError(io) => {
                    tracing::error!("Staged file unreadable: {}", io);
                    internal()
                }
                other => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "decode_error",
                    format!("Could not read document: {}", other),
                ),
            },
            AppError::Extraction(ExtractionError::Ocr(e)) => {
                let status = e.status_code();
                let code = match status {
                    StatusCode::SERVICE_UNAVAILABLE => "ocr_unavailable",
                    StatusCode::BAD_GATEWAY => "ocr_failed",
                    _ => "internal_error",
                };
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!("OCR preparation error: {}", e);
                    internal()
                } else {
                    (status, code, e.to_string())
                }
            }
            AppError::Extraction(ExtractionError::Staging(e)) => {
                tracing::error!("Staging error: {}", e);
                internal()
            }
            AppError::Store(e) => {
                tracing::error!("Account store error: {}", e);
                internal()
            }
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) && status.is_server_error() {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
