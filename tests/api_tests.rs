use news_scraper_api::{
    AppConfig, AppState, create_router,
    models::{Article, NewsPage},
    repository::{InMemoryRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub api_key: String,
}

/// Serves the full router over a real socket, backed by the in-memory store.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let config = AppConfig::default();
    let api_key = config.api_key.clone();

    let router = create_router(AppState { repo, config });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, api_key }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_openapi_document_lists_news_paths() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let doc: serde_json::Value = client
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/v1/news"].is_object());
    assert!(doc["paths"]["/api/v1/news/{id}"].is_object());
}

#[tokio::test]
async fn test_article_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Create
    let response = client
        .post(format!("{}/api/v1/news", app.address))
        .query(&[("api_key", app.api_key.as_str())])
        .json(&serde_json::json!({
            "title": "Title 5", "source_name": "BBC", "source_unique_id": "id5",
            "url": "url5", "img_url": "img_url5", "description": "description5"
        }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 201);
    let created: Article = response.json().await.unwrap();
    assert_eq!(created.title, "Title 5");

    // Listed under its source, regardless of case
    let page: NewsPage = client
        .get(format!("{}/api/v1/news", app.address))
        .query(&[("source", "bbc")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.result, vec![created.clone()]);

    // Update
    let response = client
        .put(format!("{}/api/v1/news/{}", app.address, created.id))
        .query(&[("api_key", app.api_key.as_str())])
        .json(&serde_json::json!({ "title": "Updated title" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: Article = response.json().await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Updated title");
    assert_eq!(updated.created, created.created);

    // Delete
    let response = client
        .delete(format!("{}/api/v1/news/{}", app.address, created.id))
        .query(&[("api_key", app.api_key.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/api/v1/news/{}", app.address, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
