use std::sync::Arc;
use std::time::Duration;

use ai_news_cache::news::fallback::fallback_items;
use ai_news_cache::news::fetcher::SearchClient;
use ai_news_cache::storage::{CacheConfig, FileStore, MemoryStore, NewsRepository};
use ai_news_cache::{Category, Config};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

// End-to-end: mocked search API through the normalizer and cache into a
// file-backed store.

fn search_response() -> serde_json::Value {
    json!({
        "hits": [
            {
                "_source": {
                    "title": "Google announces new AI chip",
                    "summary": "Google's latest TPU.",
                    "published_at": "2025-08-18T08:00:00Z",
                    "source": "The Verge",
                    "url": "https://theverge.com/google-chip",
                    "image_url": "https://theverge.com/google-chip.jpg",
                    "tags": ["Google", "TPU"]
                }
            },
            {
                "title": "AI 의료 영상 진단 상용화",
                "content": "의료 영상 분야에서 AI 진단 솔루션이 상용화 단계에 들어섰다.",
                "published_at": "2025-08-17T10:00:00"
            },
            {
                "_source": { "title": "Open source model tops leaderboard" }
            }
        ]
    })
}

async fn mount_search(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .and(header("X-API-KEY", "test-key"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, cache_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.upstream.base_url = server.uri();
    config.upstream.api_key = "test-key".to_string();
    config.cache.cache_dir = Some(cache_dir.path().to_path_buf());
    config
}

#[tokio::test]
async fn test_search_to_file_store_workflow() {
    let server = MockServer::start().await;
    mount_search(&server, ResponseTemplate::new(200).set_body_json(search_response())).await;
    let cache_dir = TempDir::new().unwrap();
    let config = config_for(&server, &cache_dir);

    let repo = NewsRepository::from_config(&config).await.unwrap();
    let items = repo.force_refresh().await.unwrap();

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].category, Category::Google);
    assert_eq!(items[0].source, "The Verge");
    assert_eq!(items[1].category, Category::Medical);
    assert_eq!(items[1].source, "Unknown");
    assert_eq!(items[1].url, "#");
    assert!(!items[1].summary.is_empty());
    assert_eq!(items[2].category, Category::OpenSource);

    assert!(cache_dir.path().join("news-cache.json").exists());

    // A new process over the same directory serves from disk without a request.
    let requests_before = server.received_requests().await.unwrap().len();
    let reopened = NewsRepository::from_config(&config).await.unwrap();
    assert_eq!(reopened.all_items().await, items);
    assert_eq!(server.received_requests().await.unwrap().len(), requests_before);
}

#[tokio::test]
async fn test_first_read_seeds_and_background_refill_lands() {
    let server = MockServer::start().await;
    mount_search(&server, ResponseTemplate::new(200).set_body_json(search_response())).await;
    let cache_dir = TempDir::new().unwrap();
    let config = config_for(&server, &cache_dir);

    let repo = NewsRepository::from_config(&config).await.unwrap();
    assert_eq!(repo.front_page_items().await, fallback_items());

    repo.cache().wait_for_background_refill().await;
    let status = repo.status();
    assert!(!status.stale);
    assert_eq!(status.count, 3);
    assert_eq!(repo.front_page_items().await[0].title, "Google announces new AI chip");
}

#[tokio::test]
async fn test_server_errors_fall_back_to_stale_file() {
    let server = MockServer::start().await;
    mount_search(&server, ResponseTemplate::new(500)).await;
    let cache_dir = TempDir::new().unwrap();
    let config = config_for(&server, &cache_dir);

    let store = FileStore::new(cache_dir.path()).unwrap();
    let stale = snapshot_aged(90, &["Yesterday's story"]);
    ai_news_cache::storage::KeyValueStore::save(&store, "news-cache", &stale.to_json().unwrap())
        .await
        .unwrap();

    let repo = NewsRepository::from_config(&config).await.unwrap();
    assert_eq!(repo.all_items().await, stale.items);
    assert!(repo.force_refresh().await.is_err());
}

#[tokio::test]
async fn test_slow_upstream_abandoned_by_background_deadline() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(5))
            .set_body_json(search_response()),
    )
    .await;

    let client = SearchClient::with_options(
        &server.uri(),
        "test-key",
        Duration::from_secs(30),
        "integration-test".to_string(),
    )
    .unwrap();
    let config = CacheConfig {
        background_deadline: Duration::from_millis(200),
        ..CacheConfig::default()
    };
    let repo = NewsRepository::with_parts(config, Arc::new(MemoryStore::new()), Arc::new(client)).await;

    assert_eq!(repo.all_items().await, fallback_items());
    tokio::time::timeout(Duration::from_secs(2), repo.cache().wait_for_background_refill())
        .await
        .expect("background refill should give up at its deadline");
    assert!(repo.status().is_seeded());
}

#[tokio::test]
async fn test_concurrent_stale_reads_share_one_refill() {
    let store = MemoryStore::new();
    persist(&store, &snapshot_aged(45, &["Stale"])).await;

    let source = ScriptedSource::slow(&["Refilled"], Duration::from_millis(100));
    let repo = repository(&store, source.clone()).await;

    let reads = (0..10).map(|_| {
        let repo = repo.clone();
        async move { repo.all_items().await }
    });
    let results = futures::future::join_all(reads).await;

    assert_eq!(source.calls(), 1);
    for items in results {
        assert_eq!(titles(&items), ["Refilled"]);
    }
}

#[tokio::test]
async fn test_concurrent_stale_reads_share_one_failed_refill() {
    let store = MemoryStore::new();
    let stale = snapshot_aged(45, &["Stale"]);
    persist(&store, &stale).await;

    let source = ScriptedSource::slow(&["Never served"], Duration::from_millis(200));
    source.set_failing(true);
    let repo = repository(&store, source.clone()).await;

    let started = std::time::Instant::now();
    let reads = (0..10).map(|_| {
        let repo = repo.clone();
        async move { repo.all_items().await }
    });
    let results = futures::future::join_all(reads).await;

    assert_eq!(source.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
    for items in results {
        assert_eq!(items, stale.items);
    }
    assert_eq!(repo.stats().refill_failures, 1);

    // A later read is a new attempt.
    repo.all_items().await;
    assert_eq!(source.calls(), 2);
}
