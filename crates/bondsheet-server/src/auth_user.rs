use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use bondsheet_core::AuthError;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor that enforces a valid bearer token on protected routes.
///
/// Carries the verified username; handlers that take an `AuthUser` argument
/// reject unauthenticated requests with 401 before running.
pub struct AuthUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Auth(AuthError::InvalidToken))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Auth(AuthError::InvalidToken))?;

        let username = state.tokens.verify(token)?;
        Ok(Self(username))
    }
}
