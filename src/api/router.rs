use std::path::Path;

use axum::{middleware, routing::get, Router};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::analysis;
use super::health;
use super::middleware::{logging_middleware, security_headers_middleware};
use super::state::AppState;

pub const DEFAULT_STATIC_DIR: &str = "public";

/// Create the full router serving the static site from `public/`
pub fn create_router_with_state(state: AppState) -> Router {
    create_router_with_static_dir(state, DEFAULT_STATIC_DIR)
}

/// Create the full router. Unknown paths fall back to the static site, with
/// `index.html` served for anything not found on disk.
pub fn create_router_with_static_dir(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();
    let static_service =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Analysis cache API
        .nest("/api/analysis", analysis::create_analysis_router())
        .with_state(state)
        .fallback_service(static_service)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
