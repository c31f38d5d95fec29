//! # bondsheet-server
//!
//! HTTP surface for the bondsheet exports: login, upload-and-process
//! endpoints, and the error → status mapping. The router is assembled here
//! so integration tests can drive it without a listening socket.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth_user;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    // The historical deployment served a browser frontend from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/token", post(routes::token::issue_token))
        .route("/upload-csv", post(routes::export::upload_csv))
        .route("/alpha-source", post(routes::export::alpha_source))
        .route("/public-bonds", get(routes::export::public_bonds))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
