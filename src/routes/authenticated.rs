use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Create, update and delete. Every route here requires a valid `api_key` query
/// parameter; the check is layered onto this router in `create_router` and repeated by
/// the `ApiKey` extractor each handler takes.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/v1/news?api_key=...
        .route("/api/v1/news", post(handlers::create_article))
        // PUT/DELETE /api/v1/news/{id}?api_key=...
        // Shares its path with the public GET; the routers are merged per method.
        .route(
            "/api/v1/news/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
}
