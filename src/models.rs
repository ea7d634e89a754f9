use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

/// Number of articles returned per listing page.
pub const PAGE_SIZE: i64 = 10;

// --- Stored Records ---

/// Article
///
/// A scraped news item as persisted in the `articles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Article {
    // Assigned by the store on insert, never changed afterwards.
    pub id: Uuid,
    pub title: String,
    // Publication the article was scraped from. Filtering compares it case-insensitively.
    pub source_name: String,
    // Upstream identifier; unique across the collection so an article is stored once.
    pub source_unique_id: String,
    pub url: String,
    pub img_url: String,
    pub description: String,
    // Sole listing sort key (newest first).
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
}

/// NewArticle
///
/// A fully-validated article ready for insertion. The store assigns the `id`.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub source_name: String,
    pub source_unique_id: String,
    pub url: String,
    pub img_url: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

// --- Request Payloads ---

/// CreateArticleRequest
///
/// Input payload for `POST /api/v1/news`. Every text field is required and unknown
/// fields are rejected, so a typo in a field name fails loudly instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub source_name: String,
    pub source_unique_id: String,
    pub url: String,
    pub img_url: String,
    pub description: String,
    /// Defaults to the time of insertion when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created: Option<DateTime<Utc>>,
}

impl CreateArticleRequest {
    /// Checks the required text fields and stamps `created` with `now` if the client did not.
    pub fn into_new_article(self, now: DateTime<Utc>) -> Result<NewArticle, ApiError> {
        require_text("title", &self.title)?;
        require_text("source_name", &self.source_name)?;
        require_text("source_unique_id", &self.source_unique_id)?;
        require_text("url", &self.url)?;
        require_text("img_url", &self.img_url)?;
        require_text("description", &self.description)?;

        Ok(NewArticle {
            title: self.title,
            source_name: self.source_name,
            source_unique_id: self.source_unique_id,
            url: self.url,
            img_url: self.img_url,
            description: self.description,
            created: self.created.unwrap_or(now),
        })
    }
}

/// UpdateArticleRequest
///
/// Partial update payload for `PUT /api/v1/news/{id}`. Only the fields present are
/// written; `id` and `created` are not part of the shape and are rejected if sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_unique_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateArticleRequest {
    /// Provided fields must still be non-empty.
    pub fn validate(&self) -> Result<(), ApiError> {
        let fields = [
            ("title", &self.title),
            ("source_name", &self.source_name),
            ("source_unique_id", &self.source_unique_id),
            ("url", &self.url),
            ("img_url", &self.img_url),
            ("description", &self.description),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                require_text(name, value)?;
            }
        }
        Ok(())
    }

    /// Applies the provided fields onto `article`, leaving everything else untouched.
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(source_name) = &self.source_name {
            article.source_name = source_name.clone();
        }
        if let Some(source_unique_id) = &self.source_unique_id {
            article.source_unique_id = source_unique_id.clone();
        }
        if let Some(url) = &self.url {
            article.url = url.clone();
        }
        if let Some(img_url) = &self.img_url {
            article.img_url = img_url.clone();
        }
        if let Some(description) = &self.description {
            article.description = description.clone();
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

// --- Listing ---

/// NewsPage
///
/// One page of the article listing. `hasNext` tells the client whether requesting
/// `pageNumber + 1` would return anything.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NewsPage {
    pub result: Vec<Article>,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "pageNumber")]
    pub page_number: i64,
}

/// ErrorMessage
///
/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorMessage {
    pub message: String,
}
