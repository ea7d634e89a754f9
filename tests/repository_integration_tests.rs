use chrono::{DateTime, Utc};
use news_scraper_api::{
    StoreError,
    models::{NewArticle, UpdateArticleRequest},
    repository::{ArticleFilter, ArticleRepository, InMemoryRepository, PostgresRepository, SortOrder},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Data Helpers ---

fn new_article(unique_id: &str, source: &str, secs: i64) -> NewArticle {
    NewArticle {
        title: format!("Title {unique_id}"),
        source_name: source.to_string(),
        source_unique_id: unique_id.to_string(),
        url: format!("https://example.com/{unique_id}"),
        img_url: format!("https://example.com/{unique_id}.jpg"),
        description: "description".to_string(),
        created: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
    }
}

/// Runs the shared contract checks against any backend. Unique ids are prefixed so
/// repeated runs against a persistent database do not collide.
async fn exercise_contract(repo: &dyn ArticleRepository, prefix: &str) {
    let bbc = format!("{prefix}-BBC");
    let id_old = repo.insert(new_article(&format!("{prefix}-old"), &bbc, 1_000)).await.unwrap();
    let id_new = repo.insert(new_article(&format!("{prefix}-new"), &bbc, 3_000)).await.unwrap();
    let id_mid = repo
        .insert(new_article(&format!("{prefix}-mid"), &format!("{prefix}-CNN"), 2_000))
        .await
        .unwrap();

    // Lookup round-trips the stored fields.
    let fetched = repo.find_by_id(&id_mid.to_string()).await.unwrap();
    assert_eq!(fetched.id, id_mid);
    assert_eq!(fetched.source_unique_id, format!("{prefix}-mid"));

    // Filter is case-insensitive and count agrees with it.
    let filter = ArticleFilter::by_source(bbc.to_lowercase());
    assert_eq!(repo.count(&filter).await.unwrap(), 2);
    let listed = repo.find_all(&filter, SortOrder::NewestFirst, 0, 10).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![id_new, id_old]);

    let oldest_first = repo.find_all(&filter, SortOrder::OldestFirst, 0, 10).await.unwrap();
    assert_eq!(oldest_first[0].id, id_old);

    // Skip and limit slice the ordered result.
    let window = repo.find_all(&filter, SortOrder::NewestFirst, 1, 1).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id, id_old);

    // Duplicate unique id is reported with the offending value.
    let dup = repo.insert(new_article(&format!("{prefix}-old"), &bbc, 4_000)).await;
    assert!(matches!(dup, Err(StoreError::Duplicate(ref id)) if *id == format!("{prefix}-old")));

    // Partial update.
    let changes = UpdateArticleRequest {
        title: Some("changed".to_string()),
        ..UpdateArticleRequest::default()
    };
    repo.update_by_id(&id_old.to_string(), changes).await.unwrap();
    let updated = repo.find_by_id(&id_old.to_string()).await.unwrap();
    assert_eq!(updated.title, "changed");
    assert_eq!(updated.source_name, bbc);
    assert_eq!(updated.created, DateTime::<Utc>::from_timestamp(1_000, 0).unwrap());

    // Delete is permanent.
    repo.delete_by_id(&id_old.to_string()).await.unwrap();
    assert!(matches!(repo.find_by_id(&id_old.to_string()).await, Err(StoreError::NotFound)));
    assert!(matches!(repo.delete_by_id(&id_old.to_string()).await, Err(StoreError::NotFound)));
    assert!(matches!(
        repo.update_by_id(&id_old.to_string(), UpdateArticleRequest::default()).await,
        Err(StoreError::NotFound)
    ));

    // Malformed ids are a validation failure on every id-taking operation.
    assert!(matches!(repo.find_by_id("xyz").await, Err(StoreError::Validation(_))));
    assert!(matches!(repo.delete_by_id("xyz").await, Err(StoreError::Validation(_))));
    assert!(matches!(
        repo.update_by_id("xyz", UpdateArticleRequest::default()).await,
        Err(StoreError::Validation(_))
    ));
}

// --- In-Memory ---

#[tokio::test]
async fn test_in_memory_repository_contract() {
    let repo = InMemoryRepository::new();
    exercise_contract(&repo, "mem").await;
}

#[tokio::test]
async fn test_in_memory_update_keeps_own_unique_id() {
    let repo = InMemoryRepository::new();
    let id = repo.insert(new_article("same", "BBC", 1)).await.unwrap();

    // Re-sending the record's own unique id is not a conflict.
    let changes = UpdateArticleRequest {
        source_unique_id: Some("same".to_string()),
        ..UpdateArticleRequest::default()
    };
    assert!(repo.update_by_id(&id.to_string(), changes).await.is_ok());
}

#[tokio::test]
async fn test_in_memory_negative_window_is_empty_or_clamped() {
    let repo = InMemoryRepository::new();
    repo.insert(new_article("one", "BBC", 1)).await.unwrap();

    let all = ArticleFilter::default();
    assert_eq!(repo.find_all(&all, SortOrder::NewestFirst, -5, 10).await.unwrap().len(), 1);
    assert!(repo.find_all(&all, SortOrder::NewestFirst, 0, -1).await.unwrap().is_empty());
}

// --- Postgres ---

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a Postgres instance"]
async fn test_postgres_repository_contract() {
    dotenv::dotenv().ok();

    let db_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set to run integration tests");
    let pool = PgPool::connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations.");

    let repo = PostgresRepository::new(pool);
    let prefix = Uuid::new_v4().simple().to_string();
    exercise_contract(&repo, &prefix).await;

    // Values Postgres refuses surface as validation failures, not database errors.
    let mut refused = new_article(&format!("{prefix}-nul"), "BBC", 1);
    refused.title = "a\u{0}b".to_string();
    assert!(matches!(repo.insert(refused).await, Err(StoreError::Validation(_))));

    let nul_source = ArticleFilter::by_source("a\u{0}b");
    assert!(matches!(repo.count(&nul_source).await, Err(StoreError::Validation(_))));
}
