//! Request guard for protected routes
//!
//! Add `CurrentUser` as a handler argument to require a valid token. The
//! token is read from `x-access-token`, falling back to
//! `Authorization: Bearer <token>`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::accounts::UserAccount;
use crate::error::AppError;
use crate::state::AppState;

use super::token::AuthError;

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// The account resolved from the request's session token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserAccount);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let user_id = state.tokens().verify(token)?;

        let account = state
            .accounts()
            .find_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)?;

        tracing::debug!(user_id = %account.id, "Request authenticated");
        Ok(CurrentUser(account))
    }
}

/// Pull the raw token out of the request headers
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let from_custom = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_custom.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_token(&headers), Some("abc.def"));

        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(extract_token(&headers), Some("xyz"));
    }

    #[test]
    fn test_extract_token_ignores_blank_and_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_token(&headers), None);

        headers.insert(ACCESS_TOKEN_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_token(&headers), None);
    }
}
