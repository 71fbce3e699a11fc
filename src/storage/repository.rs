use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::news::fetcher::{NewsSource, SearchClient};
use crate::news::{Category, NewsItem};
use crate::storage::cache::{CacheConfig, CacheStats, CacheStatus, NewsCache};
use crate::storage::file_store::FileStore;
use crate::storage::traits::{KeyValueStore, MemoryStore};

/// Items shown on the front page.
pub const FRONT_PAGE_LIMIT: usize = 6;

/// What rendering code talks to.
///
/// Reads always return something: fresh items, stale items, or the built-in
/// fallback set. Failures are only visible through [`status`](Self::status)
/// and [`force_refresh`](Self::force_refresh).
#[derive(Clone)]
pub struct NewsRepository {
    cache: NewsCache,
}

impl NewsRepository {
    pub fn new(cache: NewsCache) -> Self {
        Self { cache }
    }

    /// Wire up the file-backed store and the HTTP search client from config.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.cache_dir()?)?);
        let source = Arc::new(SearchClient::from_config(&config.upstream)?);
        Ok(Self::with_parts(CacheConfig::from_config(config), store, source).await)
    }

    pub async fn with_parts(
        config: CacheConfig,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn NewsSource>,
    ) -> Self {
        Self::new(NewsCache::open(config, store, source).await)
    }

    /// Repository that persists nothing beyond the process.
    pub async fn with_memory_storage(source: Arc<dyn NewsSource>) -> Self {
        Self::with_parts(CacheConfig::default(), Arc::new(MemoryStore::new()), source).await
    }

    pub fn cache(&self) -> &NewsCache {
        &self.cache
    }

    /// The first [`FRONT_PAGE_LIMIT`] items of the current generation.
    pub async fn front_page_items(&self) -> Vec<NewsItem> {
        let mut items = self.cache.items().await;
        items.truncate(FRONT_PAGE_LIMIT);
        debug!("Front page: {} items", items.len());
        items
    }

    pub async fn all_items(&self) -> Vec<NewsItem> {
        self.cache.items().await
    }

    pub async fn items_by_category(&self, category: Category) -> Vec<NewsItem> {
        self.cache
            .items()
            .await
            .into_iter()
            .filter(|item| item.category == category)
            .collect()
    }

    /// Items whose title, summary or tags contain `keyword`, ignoring case.
    pub async fn search(&self, keyword: &str) -> Vec<NewsItem> {
        self.cache
            .items()
            .await
            .into_iter()
            .filter(|item| item.matches_keyword(keyword))
            .collect()
    }

    pub async fn force_refresh(&self) -> Result<Vec<NewsItem>> {
        self.cache.force_refresh().await
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await
    }

    pub fn status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
