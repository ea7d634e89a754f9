use crate::{
    AppState,
    auth::ApiKey,
    error::ApiError,
    extract::{StrictJson, StrictPath, StrictQuery},
    models::{Article, CreateArticleRequest, ErrorMessage, NewsPage, PAGE_SIZE, UpdateArticleRequest},
    repository::{ArticleFilter, SortOrder},
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

// --- Query Structs ---

/// NewsQuery
///
/// Query parameters accepted by the listing endpoint (GET /api/v1/news).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct NewsQuery {
    /// Only return articles whose source name matches, ignoring case.
    pub source: Option<String>,
    /// 1-based page number. Defaults to 1.
    pub page: Option<String>,
}

/// Parses the `page` parameter. Absent or empty means the first page; anything that is
/// not a positive integer is rejected.
pub fn parse_page(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(raw) => raw,
    };

    match raw.parse::<i64>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(ApiError::BadRequest(format!(
            "page must be a positive integer, got '{raw}'"
        ))),
    }
}

// --- Handlers ---

/// list_articles
///
/// [Public Route] Lists articles newest first, ten per page, optionally restricted to
/// one source.
#[utoipa::path(
    get,
    path = "/api/v1/news",
    params(NewsQuery),
    responses(
        (status = 200, description = "One page of articles", body = NewsPage),
        (status = 400, description = "Invalid page number", body = ErrorMessage)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    StrictQuery(query): StrictQuery<NewsQuery>,
) -> Result<Json<NewsPage>, ApiError> {
    let page = parse_page(query.page.as_deref())?;
    let offset = (page - 1)
        .checked_mul(PAGE_SIZE)
        .ok_or_else(|| ApiError::BadRequest(format!("page {page} is out of range")))?;

    // An empty `source` behaves like no filter at all.
    let filter = match query.source.filter(|s| !s.is_empty()) {
        Some(source) => ArticleFilter::by_source(source),
        None => ArticleFilter::default(),
    };

    let total = state.repo.count(&filter).await?;
    let result = state
        .repo
        .find_all(&filter, SortOrder::NewestFirst, offset, PAGE_SIZE)
        .await?;

    Ok(Json(NewsPage {
        result,
        has_next: offset.saturating_add(PAGE_SIZE) < total,
        page_number: page,
    }))
}

/// get_article
///
/// [Public Route] Retrieves a single article by id.
///
/// *Note*: an id that is not a UUID is answered with 502, as the legacy API did.
#[utoipa::path(
    get,
    path = "/api/v1/news/{id}",
    params(("id" = String, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 404, description = "Not Found", body = ErrorMessage),
        (status = 502, description = "Malformed id", body = ErrorMessage)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    StrictPath(id): StrictPath<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state.repo.find_by_id(&id).await?;
    Ok(Json(article))
}

/// create_article
///
/// [Authenticated Route] Stores a new article. The response is re-read from the store
/// so it carries the server-assigned `id` and `created`.
#[utoipa::path(
    post,
    path = "/api/v1/news",
    params(("api_key" = String, Query, description = "API key")),
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 400, description = "Invalid payload", body = ErrorMessage),
        (status = 401, description = "Missing or invalid API key", body = ErrorMessage),
        (status = 409, description = "Duplicate source unique id", body = ErrorMessage)
    )
)]
pub async fn create_article(
    _key: ApiKey,
    State(state): State<AppState>,
    StrictJson(payload): StrictJson<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let new_article = payload.into_new_article(Utc::now())?;
    let id = state.repo.insert(new_article).await?;
    let article = state.repo.find_by_id(&id.to_string()).await?;

    tracing::info!(article_id = %article.id, source = %article.source_name, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Authenticated Route] Overwrites the fields present in the payload. `id` and
/// `created` never change.
#[utoipa::path(
    put,
    path = "/api/v1/news/{id}",
    params(
        ("id" = String, Path, description = "Article ID"),
        ("api_key" = String, Query, description = "API key")
    ),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 400, description = "Invalid payload", body = ErrorMessage),
        (status = 401, description = "Missing or invalid API key", body = ErrorMessage),
        (status = 404, description = "Not Found", body = ErrorMessage),
        (status = 409, description = "Duplicate source unique id", body = ErrorMessage),
        (status = 502, description = "Malformed id", body = ErrorMessage)
    )
)]
pub async fn update_article(
    _key: ApiKey,
    State(state): State<AppState>,
    StrictPath(id): StrictPath<String>,
    StrictJson(payload): StrictJson<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    state.repo.find_by_id(&id).await?;
    payload.validate()?;

    state.repo.update_by_id(&id, payload).await?;
    let article = state.repo.find_by_id(&id).await?;

    tracing::info!(article_id = %article.id, "article updated");
    Ok(Json(article))
}

/// delete_article
///
/// [Authenticated Route] Permanently removes an article.
#[utoipa::path(
    delete,
    path = "/api/v1/news/{id}",
    params(
        ("id" = String, Path, description = "Article ID"),
        ("api_key" = String, Query, description = "API key")
    ),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Missing or invalid API key", body = ErrorMessage),
        (status = 404, description = "Not Found", body = ErrorMessage),
        (status = 502, description = "Malformed id", body = ErrorMessage)
    )
)]
pub async fn delete_article(
    _key: ApiKey,
    State(state): State<AppState>,
    StrictPath(id): StrictPath<String>,
) -> Result<StatusCode, ApiError> {
    state.repo.find_by_id(&id).await?;
    state.repo.delete_by_id(&id).await?;

    tracing::info!(article_id = %id, "article deleted");
    Ok(StatusCode::OK)
}
