#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ai_news_cache::error::{Error, Result};
use ai_news_cache::news::fetcher::NewsSource;
use ai_news_cache::news::normalizer::normalize_all;
use ai_news_cache::news::{CacheSnapshot, RawRecord, SearchQuery};
use ai_news_cache::storage::{CacheConfig, KeyValueStore, MemoryStore, NewsRepository};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;

/// Search source whose answers are set by the test.
pub struct ScriptedSource {
    records: parking_lot::Mutex<Vec<RawRecord>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn healthy(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            records: parking_lot::Mutex::new(records(titles)),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: None,
        })
    }

    pub fn failing() -> Arc<Self> {
        let source = Self::healthy(&[]);
        source.set_failing(true);
        source
    }

    pub fn slow(titles: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            records: parking_lot::Mutex::new(records(titles)),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_titles(&self, titles: &[&str]) {
        *self.records.lock() = records(titles);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for ScriptedSource {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<RawRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Upstream("HTTP 503 from scripted source".to_string()));
        }
        Ok(self.records.lock().clone())
    }
}

/// Store whose writes always fail; reads see nothing.
pub struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn load(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Persistence("disk full".to_string()))
    }

    async fn clear(&self, _key: &str) -> Result<()> {
        Err(Error::Persistence("read-only filesystem".to_string()))
    }
}

pub fn records(titles: &[&str]) -> Vec<RawRecord> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            RawRecord::new(json!({
                "_source": {
                    "title": title,
                    "summary": format!("Summary of {}", title),
                    "source": "Scripted",
                    "url": format!("https://news.example.com/{}", i),
                    "published_at": "2025-08-15T09:30:00Z",
                    "tags": ["AI"]
                }
            }))
        })
        .collect()
}

/// A snapshot last refreshed `minutes` ago.
pub fn snapshot_aged(minutes: i64, titles: &[&str]) -> CacheSnapshot {
    let epoch = Utc::now() - ChronoDuration::minutes(minutes);
    CacheSnapshot::new(epoch, normalize_all(&records(titles), epoch))
}

pub async fn persist(store: &MemoryStore, snapshot: &CacheSnapshot) {
    store
        .save("news-cache", &snapshot.to_json().unwrap())
        .await
        .unwrap();
}

pub async fn repository(store: &MemoryStore, source: Arc<ScriptedSource>) -> NewsRepository {
    NewsRepository::with_parts(CacheConfig::default(), Arc::new(store.clone()), source).await
}

pub fn titles(items: &[ai_news_cache::NewsItem]) -> Vec<String> {
    items.iter().map(|i| i.title.clone()).collect()
}
