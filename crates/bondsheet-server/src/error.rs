use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bondsheet_core::{AuthError, ExtractError, ProviderError, TabularError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level errors mapped to HTTP statuses.
///
/// Per-symbol provider failures never reach this type; they are absorbed
/// into placeholder fields upstream. What remains is auth, a broken upload,
/// or a batch that produced nothing at all.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid upload: {0}")]
    Upload(String),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Tabular(#[from] TabularError),

    /// A whole-request provider failure. Only the bulk listing surfaces
    /// these; per-symbol fetches absorb theirs.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Upload(_) | Self::Extract(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Tabular(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        // FastAPI-style error body, kept for client compatibility.
        let body = Json(json!({ "detail": self.to_string() }));

        if matches!(self, Self::Auth(_)) {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
