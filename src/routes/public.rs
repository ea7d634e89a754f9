use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/v1/news?source=...&page=...
        // Paginated listing, newest first, optionally filtered by source name.
        .route("/api/v1/news", get(handlers::list_articles))
        // GET /api/v1/news/{id}
        .route("/api/v1/news/{id}", get(handlers::get_article))
}
