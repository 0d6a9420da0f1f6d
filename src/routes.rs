//! Top-level router.
//!
//! # Route Structure
//!
//! - `GET  /{code}`             - Short URL redirect
//! - `GET  /health`             - Health check: store, cache, visit queue
//! - `POST /api/shorten`        - Create a short URL
//! - `GET  /api/stats/{code}`   - Visit statistics
//!
//! Requests are traced and trailing slashes trimmed before routing.

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Routes and tracing, without path normalization.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes())
        .with_state(state)
        .layer(tracing::layer())
}

/// The service handed to `axum::serve`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
