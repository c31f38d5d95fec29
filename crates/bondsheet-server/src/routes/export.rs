use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bondsheet_core::{extract_symbols, render_bonds, render_intraday, render_listing};
use tracing::info;

use crate::auth_user::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /upload-csv` — exchange export. One row per uploaded symbol.
pub async fn upload_csv(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_file_field(multipart).await?;
    let symbols = extract_symbols(&upload)?;

    info!(user = %user, symbols = symbols.len(), "exchange export started");

    let exchange = state.exchange.clone();
    let records = state
        .coordinator
        .run(symbols, move |symbol| {
            let client = exchange.clone();
            async move { client.fetch_bond(symbol).await }
        })
        .await;

    let body = render_bonds(&records)?;
    info!(user = %user, rows = records.len(), "exchange export finished");

    Ok(csv_attachment("bonos_byma.csv", body))
}

/// `POST /alpha-source` — intraday export. Minute bars of the latest
/// trading day per uploaded symbol; symbols without data contribute no rows.
pub async fn alpha_source(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_file_field(multipart).await?;
    let symbols = extract_symbols(&upload)?;

    info!(user = %user, symbols = symbols.len(), "intraday export started");

    let intraday = state.intraday.clone();
    let per_symbol = state
        .coordinator
        .run(symbols, move |symbol| {
            let client = intraday.clone();
            async move { client.fetch_intraday(symbol).await }
        })
        .await;

    let rows: Vec<_> = per_symbol.into_iter().flatten().collect();
    let body = render_intraday(&rows)?;
    info!(user = %user, rows = rows.len(), "intraday export finished");

    Ok(csv_attachment("alpha_intraday.csv", body))
}

/// `GET /public-bonds` — bulk listing export. No upload involved; the
/// exchange decides which symbols appear.
pub async fn public_bonds(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, ApiError> {
    let bonds = state.exchange.list_public_bonds().await?;
    let body = render_listing(&bonds)?;
    info!(user = %user, rows = bonds.len(), "listing export finished");

    Ok(csv_attachment("bonos_byma.csv", body))
}

/// Pull the bytes of the multipart `file` field.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| ApiError::Upload(error.to_string()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|error| ApiError::Upload(error.to_string()))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::Upload(String::from("missing 'file' field")))
}

fn csv_attachment(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, String::from("text/csv")),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
