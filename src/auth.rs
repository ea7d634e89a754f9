use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::{config::AppConfig, error::ApiError};

/// Query parameters the gate looks at. Anything else in the query string is ignored.
#[derive(Debug, Deserialize)]
struct ApiKeyParams {
    api_key: Option<String>,
}

/// ApiKey Extractor Result
///
/// Proof that the request carried the configured API key. Mutating handlers take it as
/// their first argument, so they cannot run without the gate having passed.
#[derive(Debug, Clone)]
pub struct ApiKey;

/// ApiKey Extractor Implementation
///
/// Reads `api_key` from the query string and compares it with `AppConfig::api_key`.
///
/// *Mechanism*: only the request parts are inspected, so the extractor can run inside
/// the router's `route_layer` before any body is buffered. The same extractor is then
/// taken again by each write handler, so a write route registered without the layer is
/// still gated.
///
/// Rejection: `ApiError::MissingApiKey` when the parameter is absent or empty,
/// `ApiError::InvalidApiKey` when it does not match. Both render as 401.
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // An unparseable query string is treated the same as a missing key.
        let provided = Query::<ApiKeyParams>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(params)| params.api_key)
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingApiKey)?;

        if provided != config.api_key {
            tracing::warn!(path = %parts.uri.path(), "rejected request with invalid API key");
            return Err(ApiError::InvalidApiKey);
        }

        Ok(ApiKey)
    }
}
