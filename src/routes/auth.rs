//! Registration and login endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::{NewAccount, PublicUser};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

/// Create the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

/// POST /api/register
///
/// Creates an account. Does not log the user in.
async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (name, email, password) = match (
        non_blank(request.name),
        non_blank(request.email),
        non_blank(request.password),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(AppError::Validation("Missing required fields".to_string())),
    };

    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    state
        .accounts()
        .register(NewAccount {
            name,
            email,
            password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// POST /api/login
///
/// Verifies credentials and returns a signed session token.
async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (email, password) = match (non_blank(request.email), request.password) {
        (Some(email), Some(password)) if !password.is_empty() => (email, password),
        _ => {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ))
        }
    };

    let account = state.accounts().verify_credentials(&email, &password).await?;
    let issued = state.tokens().issue(account.id)?;

    tracing::info!(user_id = %account.id, "User logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: account.to_public(),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
