//! OCR upload endpoints
//!
//! - POST /upload          - public (legacy path)
//! - POST /api/ocr/public  - public
//! - POST /api/ocr         - requires a session token
//!
//! All three take a multipart body with the document in the `file` field.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;
use crate::upload::{UploadError, UploadedDocument};

/// Successful OCR response
#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub text: String,
    pub pages: usize,
}

/// Create the OCR router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(public_ocr))
        .route("/api/ocr/public", post(public_ocr))
        .route("/api/ocr", post(protected_ocr))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// OCR without authentication
async fn public_ocr(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    run_ocr(&state, &headers, multipart).await
}

/// OCR for a logged-in user
async fn protected_ocr(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    tracing::debug!(user_id = %user.id, "Authenticated OCR request");
    run_ocr(&state, &headers, multipart).await
}

async fn run_ocr(
    state: &AppState,
    headers: &HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>> {
    let mut multipart = multipart.map_err(|e| rejection_to_upload_error(headers, e))?;

    let limit = state.config().server.max_upload_bytes;
    let doc = UploadedDocument::from_multipart(&mut multipart, limit).await?;
    let text = state.pipeline().process(&doc).await?;

    Ok(Json(OcrResponse {
        text: text.joined(),
        pages: text.pages,
    }))
}

/// A body that is not multipart at all carries no file part. A multipart
/// content type the extractor still refuses (bad or missing boundary) is a
/// malformed upload.
fn rejection_to_upload_error(headers: &HeaderMap, rejection: MultipartRejection) -> UploadError {
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/"))
        .unwrap_or(false);

    if is_multipart {
        UploadError::InvalidUpload(rejection.body_text())
    } else {
        tracing::debug!("Request is not a multipart upload: {}", rejection);
        UploadError::NoFilePart
    }
}
