use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that need no session. The root is the landing page for every
/// fail-safe redirect, so it must never require a user itself.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Application root; renders the index view with the session summary.
        .route("/", get(handlers::index))
}
