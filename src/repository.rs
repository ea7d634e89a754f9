use crate::error::StoreError;
use crate::models::{Article, NewArticle, UpdateArticleRequest};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const ARTICLE_COLUMNS: &str =
    "id, title, source_name, source_unique_id, url, img_url, description, created";

/// ArticleFilter
///
/// The single predicate a listing can be narrowed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    /// Case-insensitive exact match against `source_name`.
    pub source_name: Option<String>,
}

impl ArticleFilter {
    pub fn by_source(source_name: impl Into<String>) -> Self {
        Self {
            source_name: Some(source_name.into()),
        }
    }

    fn matches(&self, article: &Article) -> bool {
        match &self.source_name {
            Some(source) => article.source_name.to_lowercase() == source.to_lowercase(),
            None => true,
        }
    }
}

/// SortOrder
///
/// Ordering on `created`. Records with equal timestamps always keep arrival order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// ArticleRepository
///
/// Abstract contract for article persistence. Handlers only see this trait, so the
/// Postgres backend and the in-memory backend are interchangeable.
///
/// Ids arrive as raw path strings; a backend reports one that is not a well-formed
/// UUID as `StoreError::Validation`.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Article, StoreError>;

    async fn find_all(
        &self,
        filter: &ArticleFilter,
        sort: SortOrder,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Article>, StoreError>;

    async fn count(&self, filter: &ArticleFilter) -> Result<i64, StoreError>;

    /// Inserts the article and returns the id the store assigned to it.
    async fn insert(&self, article: NewArticle) -> Result<Uuid, StoreError>;

    /// Overwrites only the fields present in `changes`.
    async fn update_by_id(&self, id: &str, changes: UpdateArticleRequest) -> Result<(), StoreError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;
}

/// RepositoryState
///
/// The shared handle to the article store held by `AppState`.
pub type RepositoryState = Arc<dyn ArticleRepository>;

/// Parses a path id into the store's key type.
pub fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id)
        .map_err(|e| StoreError::Validation(format!("'{id}' is not a valid article id: {e}")))
}

// --- Postgres ---

/// PostgresRepository
///
/// `ArticleRepository` backed by the `articles` table (see `migrations/`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the `WHERE` clause for `filter`, if any.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ArticleFilter) {
    if let Some(source) = &filter.source_name {
        builder.push(" WHERE LOWER(source_name) = LOWER(");
        builder.push_bind(source.clone());
        builder.push(")");
    }
}

/// SQLSTATE class 22: Postgres refused a value (bad encoding, NUL byte, out of range).
const DATA_EXCEPTION_CLASS: &str = "22";

/// Maps database errors onto the store's categories.
///
/// A unique violation becomes `Duplicate` when the caller wrote a `source_unique_id`;
/// a data exception becomes `Validation` carrying Postgres' own message. Everything
/// else stays `Database`.
fn classify(error: sqlx::Error, source_unique_id: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if let (true, Some(unique_id)) = (db.is_unique_violation(), source_unique_id) {
            return StoreError::Duplicate(unique_id.to_string());
        }
        if db
            .code()
            .is_some_and(|code| code.starts_with(DATA_EXCEPTION_CLASS))
        {
            return StoreError::Validation(db.message().to_string());
        }
    }
    StoreError::Database(error)
}

#[async_trait]
impl ArticleRepository for PostgresRepository {
    async fn find_by_id(&self, id: &str) -> Result<Article, StoreError> {
        let id = parse_id(id)?;
        let query = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");

        sqlx::query_as::<_, Article>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, None))?
            .ok_or(StoreError::NotFound)
    }

    /// Builds the listing query with `QueryBuilder` so the source filter is always bound,
    /// never interpolated.
    async fn find_all(
        &self,
        filter: &ArticleFilter,
        sort: SortOrder,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Article>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));
        push_filter(&mut builder, filter);

        builder.push(match sort {
            SortOrder::NewestFirst => " ORDER BY created DESC, seq ASC",
            SortOrder::OldestFirst => " ORDER BY created ASC, seq ASC",
        });
        builder.push(" OFFSET ");
        builder.push_bind(skip.max(0));
        builder.push(" LIMIT ");
        builder.push_bind(limit.max(0));

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(e, None))?;
        Ok(articles)
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<i64, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM articles");
        push_filter(&mut builder, filter);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, None))?;
        Ok(total)
    }

    async fn insert(&self, article: NewArticle) -> Result<Uuid, StoreError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO articles (title, source_name, source_unique_id, url, img_url, description, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&article.title)
        .bind(&article.source_name)
        .bind(&article.source_unique_id)
        .bind(&article.url)
        .bind(&article.img_url)
        .bind(&article.description)
        .bind(article.created)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, Some(article.source_unique_id.as_str())))
    }

    /// Uses `COALESCE` so a `None` field keeps the stored value.
    async fn update_by_id(&self, id: &str, changes: UpdateArticleRequest) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET title = COALESCE($2, title),
                source_name = COALESCE($3, source_name),
                source_unique_id = COALESCE($4, source_unique_id),
                url = COALESCE($5, url),
                img_url = COALESCE($6, img_url),
                description = COALESCE($7, description)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.source_name)
        .bind(&changes.source_unique_id)
        .bind(&changes.url)
        .bind(&changes.img_url)
        .bind(&changes.description)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, changes.source_unique_id.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, None))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// --- In-Memory ---

/// InMemoryRepository
///
/// `ArticleRepository` kept in process memory. Used by the test suites and by local
/// runs started without a database URL. Records are held in arrival order, which is
/// what keeps equal-timestamp ties stable.
#[derive(Default)]
pub struct InMemoryRepository {
    articles: RwLock<Vec<Article>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ArticleRepository for InMemoryRepository {
    async fn find_by_id(&self, id: &str) -> Result<Article, StoreError> {
        let id = parse_id(id)?;
        self.articles
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_all(
        &self,
        filter: &ArticleFilter,
        sort: SortOrder,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Article>, StoreError> {
        let mut matching: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();

        // `sort_by` is stable, so arrival order survives among equal timestamps.
        match sort {
            SortOrder::NewestFirst => matching.sort_by(|a, b| b.created.cmp(&a.created)),
            SortOrder::OldestFirst => matching.sort_by(|a, b| a.created.cmp(&b.created)),
        }

        Ok(matching
            .into_iter()
            .skip(to_usize(skip))
            .take(to_usize(limit))
            .collect())
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<i64, StoreError> {
        let total = self
            .articles
            .read()
            .await
            .iter()
            .filter(|a| filter.matches(a))
            .count();
        Ok(total as i64)
    }

    async fn insert(&self, article: NewArticle) -> Result<Uuid, StoreError> {
        let mut articles = self.articles.write().await;
        if articles
            .iter()
            .any(|a| a.source_unique_id == article.source_unique_id)
        {
            return Err(StoreError::Duplicate(article.source_unique_id));
        }

        let id = Uuid::new_v4();
        articles.push(Article {
            id,
            title: article.title,
            source_name: article.source_name,
            source_unique_id: article.source_unique_id,
            url: article.url,
            img_url: article.img_url,
            description: article.description,
            created: article.created,
        });
        Ok(id)
    }

    async fn update_by_id(&self, id: &str, changes: UpdateArticleRequest) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let mut articles = self.articles.write().await;

        if let Some(unique_id) = &changes.source_unique_id {
            if articles
                .iter()
                .any(|a| a.id != id && &a.source_unique_id == unique_id)
            {
                return Err(StoreError::Duplicate(unique_id.clone()));
            }
        }

        let article = articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        changes.apply_to(article);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id)?;
        let mut articles = self.articles.write().await;
        let position = articles
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        articles.remove(position);
        Ok(())
    }
}
