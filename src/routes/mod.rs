//! API Routes
//!
//! - `GET /` - Liveness probe
//! - `POST /upload_files` - Store CSV files in the knowledge folder
//! - `POST /analyze_data` - Run the analysis crew against an uploaded CSV

pub mod analysis;
pub mod files;
pub mod health;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.config.max_upload_bytes;
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let mut router = Router::new()
        .merge(health::router())
        .merge(files::router(state.clone()))
        .merge(analysis::router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    if !origins.is_empty() {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}
