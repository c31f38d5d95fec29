use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// `POST /token` — OAuth2-password-style login.
pub async fn issue_token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let access_token = state
        .tokens
        .issue(&state.credentials, &form.username, &form.password)?;

    info!(user = %form.username, "token issued");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
