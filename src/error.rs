use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// StoreError
///
/// Failures raised by an `ArticleRepository`. Each variant is a distinct category the
/// resource layer maps onto an HTTP status in `From<StoreError> for ApiError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// Carries the `source_unique_id` that collided with an existing record.
    #[error("duplicate source unique id {0:?}")]
    Duplicate(String),
    /// The store refused the input: an id that is not a well-formed UUID, or a value
    /// Postgres rejects as a data exception.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// ApiError
///
/// Every failure a request can end in. Rendered as `{"message": ...}` with the
/// status from [`ApiError::status`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please provide an API Key")]
    MissingApiKey,
    #[error("API Key not valid")]
    InvalidApiKey,
    #[error("{0}")]
    BadRequest(String),
    #[error("Article not found.")]
    NotFound,
    #[error("Article with '{0}' source unique id already in database")]
    Conflict(String),
    #[error("{0}")]
    BadUpstream(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingApiKey | ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            // Input the store refused is reported as an upstream failure, matching the legacy API.
            ApiError::BadUpstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Duplicate(unique_id) => ApiError::Conflict(unique_id),
            StoreError::Validation(message) => ApiError::BadUpstream(message),
            StoreError::Database(e) => {
                // Details stay in the logs; the client only sees a generic message.
                tracing::error!("unclassified store error: {:?}", e);
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
