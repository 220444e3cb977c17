//! Label API - upload a one-page label PDF, download the three-up sheet
//!
//! Provides:
//! - `GET /` upload page
//! - `GET /health`
//! - `POST /api/process` multipart upload, returns `processed_label.pdf`

pub mod config;
pub mod error;
pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;

/// Shared, read-only server state
pub struct AppState {
    pub config: ServerConfig,
}

pub fn build_router(config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    let state = Arc::new(AppState { config });

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/process", post(handlers::process_label))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
