use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// Routers split by access level (public reads, gated writes).
pub mod routes;
use auth::ApiKey;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, StoreError};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the news resource, served at `/api-docs/openapi.json` and
/// browsable through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_articles, handlers::get_article, handlers::create_article,
        handlers::update_article, handlers::delete_article
    ),
    components(
        schemas(
            models::Article, models::CreateArticleRequest, models::UpdateArticleRequest,
            models::NewsPage, models::ErrorMessage,
        )
    ),
    tags(
        (name = "news", description = "Scraped news articles API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The state shared by every request: the article store and the immutable configuration.
/// Handlers keep no state of their own between requests.
#[derive(Clone)]
pub struct AppState {
    /// Article persistence (Postgres or in-memory).
    pub repo: RepositoryState,
    /// The loaded environment configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// Header carrying the per-request correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// api_key_middleware
///
/// Gate for the authenticated router. Extracting `ApiKey` rejects the request with a
/// 401 before the body is read or any store operation runs.
async fn api_key_middleware(_key: ApiKey, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's routing table and wraps it in the shared middleware.
///
/// *Layering*: the API key gate is a `route_layer` on the write routes only, so it runs
/// after routing and never touches reads, Swagger UI, or unmatched paths. The
/// observability stack and CORS wrap everything, so every response (including 401s
/// from the gate) carries an `x-request-id`.
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        // Documentation: OpenAPI JSON plus the Swagger UI that renders it.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Reads and the health check are open to everyone.
        .merge(public::public_routes())
        // POST/PUT/DELETE share paths with the reads; only these methods are gated.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), api_key_middleware)),
        )
        .with_state(state);

    with_observability(routes).layer(permissive_cors())
}

/// with_observability
///
/// Wraps `router` in request correlation and tracing, outermost first:
/// 1. `SetRequestIdLayer` stamps a fresh UUID into `x-request-id` unless the client sent one.
/// 2. `TraceLayer` opens one span per request (see `trace_span_logger`) and logs the
///    status and latency in milliseconds when the response leaves.
/// 3. `PropagateRequestIdLayer` copies the id back onto the response.
fn with_observability(router: Router) -> Router {
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let on_response = DefaultOnResponse::new()
        .level(Level::INFO)
        .latency_unit(tower_http::LatencyUnit::Millis);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(on_response),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// The API is called from scrapers and dashboards on arbitrary origins.
fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with method, URI and the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = %request.uri().path(),
        req_id = %request_id,
    )
}
