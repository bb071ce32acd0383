//! Health check endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::ocr::OcrProvider;
use crate::state::AppState;

#[derive(Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    /// OCR backends that answered their availability probe
    pub ocr_providers: Vec<OcrProvider>,
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "OCR API is running",
    })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ocr_providers = state.pipeline().ocr().available_providers().await;

    Json(HealthResponse {
        status: if ocr_providers.is_empty() { "degraded" } else { "healthy" },
        version: env!("CARGO_PKG_VERSION"),
        service: "ocr-server",
        ocr_providers,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
}
