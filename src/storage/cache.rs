use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::news::fallback::fallback_items;
use crate::news::fetcher::NewsSource;
use crate::news::normalizer::normalize_all;
use crate::news::{CacheSnapshot, NewsItem, SearchQuery};
use crate::storage::traits::KeyValueStore;

/// Configuration for cache behavior
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub storage_key: String,
    pub background_deadline: Duration,
    pub query: String,
    pub max_results: usize,
    pub lookback_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CacheConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: config.cache.ttl(),
            storage_key: config.cache.storage_key.clone(),
            background_deadline: config.cache.background_deadline(),
            query: config.upstream.query.clone(),
            max_results: config.upstream.max_results,
            lookback_days: config.upstream.lookback_days,
        }
    }

    /// The query a refill sends: the fixed template over the lookback window.
    pub fn search_query(&self) -> SearchQuery {
        let since = (Utc::now() - ChronoDuration::days(i64::from(self.lookback_days))).date_naive();
        SearchQuery {
            query: self.query.clone(),
            max_results: self.max_results,
            since,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub fresh_hits: u64,
    pub stale_reads: u64,
    pub seeds: u64,
    pub refills: u64,
    pub refill_failures: u64,
    pub persist_failures: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.fresh_hits + self.stale_reads;
        if total == 0 {
            0.0
        } else {
            self.fresh_hits as f64 / total as f64
        }
    }
}

/// Point-in-time view of the cache, see [`NewsCache::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub present: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub stale: bool,
    pub count: usize,
}

impl CacheStatus {
    /// True while the cache only holds the built-in sample items.
    pub fn is_seeded(&self) -> bool {
        self.last_updated == Some(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Read-through cache over the news search API.
///
/// Holds one [`CacheSnapshot`] in memory, mirrored to a [`KeyValueStore`].
/// Reads of a fresh snapshot never touch the network; reads of a stale one
/// refill first and fall back to the stale items if the refill fails. At most
/// one refill runs at a time per cache.
#[derive(Clone)]
pub struct NewsCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    config: CacheConfig,
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn NewsSource>,
    snapshot: RwLock<Option<Arc<CacheSnapshot>>>,
    // Held for every refill and every write to the store.
    refill_lock: tokio::sync::Mutex<()>,
    // Bumped by every refill attempt, successful or not.
    attempts: AtomicU64,
    background: Mutex<Option<JoinHandle<()>>>,
    stats: RwLock<CacheStats>,
}

impl NewsCache {
    /// Build the cache, loading whatever snapshot the store holds.
    ///
    /// An unreadable or corrupt persisted value is logged and treated as
    /// absent.
    pub async fn open(
        config: CacheConfig,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn NewsSource>,
    ) -> Self {
        let snapshot = load_persisted(store.as_ref(), &config.storage_key).await;

        Self {
            inner: Arc::new(CacheInner {
                config,
                store,
                source,
                snapshot: RwLock::new(snapshot.map(Arc::new)),
                refill_lock: tokio::sync::Mutex::new(()),
                attempts: AtomicU64::new(0),
                background: Mutex::new(None),
                stats: RwLock::new(CacheStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.read().clone()
    }

    /// The snapshot currently held, without any freshness check.
    pub fn snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        self.inner.snapshot.read().clone()
    }

    /// All cached items, refilling first when the snapshot is stale.
    ///
    /// Never fails: a failed refill yields the previous items, and an empty
    /// cache is seeded with the fallback set while a real refill runs in the
    /// background.
    pub async fn items(&self) -> Vec<NewsItem> {
        match self.snapshot() {
            Some(snapshot) if !self.is_stale(&snapshot) => {
                self.inner.stats.write().fresh_hits += 1;
                debug!("Serving {} fresh cached items", snapshot.items.len());
                snapshot.items.clone()
            }
            Some(_) => {
                self.inner.stats.write().stale_reads += 1;
                self.refresh_stale().await
            }
            None => self.seed().await,
        }
    }

    /// Drop the snapshot and refill synchronously.
    ///
    /// Unlike [`items`](Self::items) this reports upstream failures; the
    /// cache is left empty in that case. A response with no records counts
    /// as a failure too, so a successful refresh never returns an empty list.
    pub async fn force_refresh(&self) -> Result<Vec<NewsItem>> {
        let _guard = self.inner.refill_lock.lock().await;
        info!("Forcing news cache refresh");

        let previous = self.invalidate_locked().await;
        let snapshot = self.refill_locked(previous, None).await?;
        Ok(snapshot.items.clone())
    }

    /// Drop the in-memory and persisted snapshot.
    pub async fn invalidate(&self) {
        let _guard = self.inner.refill_lock.lock().await;
        self.invalidate_locked().await;
    }

    /// Introspection only; never refills or persists.
    pub fn status(&self) -> CacheStatus {
        match self.snapshot() {
            Some(snapshot) => CacheStatus {
                present: true,
                last_updated: Some(snapshot.last_updated),
                stale: self.is_stale(&snapshot),
                count: snapshot.items.len(),
            },
            None => CacheStatus {
                present: false,
                last_updated: None,
                stale: true,
                count: 0,
            },
        }
    }

    /// Wait for the detached refill started by seeding, if one is running.
    pub async fn wait_for_background_refill(&self) {
        let handle = self.inner.background.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Background refill task failed: {}", e);
            }
        }
    }

    fn is_stale(&self, snapshot: &CacheSnapshot) -> bool {
        snapshot.is_stale(Utc::now(), self.inner.config.ttl)
    }

    async fn seed(&self) -> Vec<NewsItem> {
        let seeded = {
            let mut current = self.inner.snapshot.write();
            if let Some(existing) = current.as_ref() {
                return existing.items.clone();
            }
            // Epoch-stamped so the age rule treats it as stale right away.
            let snapshot = Arc::new(CacheSnapshot::new(DateTime::<Utc>::UNIX_EPOCH, fallback_items()));
            *current = Some(Arc::clone(&snapshot));
            snapshot
        };

        self.inner.stats.write().seeds += 1;
        info!("No cached news, seeded with {} fallback items", seeded.items.len());

        let items = seeded.items.clone();
        self.spawn_background_refill(seeded);
        items
    }

    async fn refresh_stale(&self) -> Vec<NewsItem> {
        let seen = self.inner.attempts.load(Ordering::SeqCst);
        let _guard = self.inner.refill_lock.lock().await;

        // Another reader attempted a refill while we waited for the lock;
        // whatever it left behind is the answer, even if it failed.
        if self.inner.attempts.load(Ordering::SeqCst) != seen {
            debug!("Refill attempted while waiting, reusing its result");
            return match self.snapshot() {
                Some(current) => current.items.clone(),
                None => fallback_items(),
            };
        }

        let previous = self.snapshot();
        match self.refill_locked(previous.as_ref().map(|s| s.last_updated), None).await {
            Ok(snapshot) => snapshot.items.clone(),
            Err(e) => {
                warn!("News refill failed, serving cached items: {}", e);
                match previous {
                    Some(snapshot) => snapshot.items.clone(),
                    None => fallback_items(),
                }
            }
        }
    }

    fn spawn_background_refill(&self, seeded: Arc<CacheSnapshot>) {
        let cache = self.clone();
        let seen = self.inner.attempts.load(Ordering::SeqCst);
        let handle = tokio::spawn(async move { cache.refresh_in_background(seeded, seen).await });

        *self.inner.background.lock() = Some(handle);
    }

    async fn refresh_in_background(&self, seeded: Arc<CacheSnapshot>, seen: u64) {
        let _guard = self.inner.refill_lock.lock().await;

        let previous = self.snapshot();
        let unchanged = previous
            .as_ref()
            .map(|current| Arc::ptr_eq(current, &seeded))
            .unwrap_or(false);
        if !unchanged {
            debug!("Seeded snapshot replaced, skipping background refill");
            return;
        }
        self.persist(&seeded).await;

        if self.inner.attempts.load(Ordering::SeqCst) != seen {
            debug!("Refill already attempted, skipping background refill");
            return;
        }

        let deadline = self.inner.config.background_deadline;
        if let Err(e) = self
            .refill_locked(Some(seeded.last_updated), Some(deadline))
            .await
        {
            warn!("Background news refill failed: {}", e);
        }
    }

    /// Fetch, normalize and commit a new snapshot. Caller holds `refill_lock`.
    ///
    /// `deadline` bounds the upstream search only; once records are in hand
    /// the commit and persist always run to completion.
    async fn refill_locked(
        &self,
        previous: Option<DateTime<Utc>>,
        deadline: Option<Duration>,
    ) -> Result<Arc<CacheSnapshot>> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        let query = self.inner.config.search_query();
        debug!("Refilling news cache (size {}, since {})", query.max_results, query.since);

        let search = self.inner.source.search(&query);
        let records = match deadline {
            Some(deadline) => tokio::time::timeout(deadline, search)
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Upstream(format!("Search abandoned after {:?}", deadline)))
                }),
            None => search.await,
        };
        let records = match records {
            Ok(records) if records.is_empty() => Err(Error::Upstream(
                "Search returned no records".to_string(),
            )),
            other => other,
        };
        let records = match records {
            Ok(records) => records,
            Err(e) => {
                self.inner.stats.write().refill_failures += 1;
                return Err(e);
            }
        };

        let fetch_epoch = next_epoch(previous, Utc::now());
        let snapshot = Arc::new(CacheSnapshot::new(fetch_epoch, normalize_all(&records, fetch_epoch)));

        *self.inner.snapshot.write() = Some(Arc::clone(&snapshot));
        self.inner.stats.write().refills += 1;
        info!("Refilled news cache with {} items", snapshot.items.len());

        self.persist(&snapshot).await;
        Ok(snapshot)
    }

    /// Caller holds `refill_lock`. Returns the dropped snapshot's timestamp.
    async fn invalidate_locked(&self) -> Option<DateTime<Utc>> {
        let previous = self.inner.snapshot.write().take().map(|s| s.last_updated);

        if let Err(e) = self.inner.store.clear(&self.inner.config.storage_key).await {
            self.inner.stats.write().persist_failures += 1;
            warn!("Failed to clear persisted news snapshot: {}", e);
        }

        debug!("News cache invalidated");
        previous
    }

    async fn persist(&self, snapshot: &CacheSnapshot) {
        let result = match snapshot.to_json() {
            Ok(json) => self.inner.store.save(&self.inner.config.storage_key, &json).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => debug!("Persisted news snapshot ({} items)", snapshot.items.len()),
            Err(e) => {
                self.inner.stats.write().persist_failures += 1;
                warn!("Failed to persist news snapshot: {}", e);
            }
        }
    }
}

async fn load_persisted(store: &dyn KeyValueStore, key: &str) -> Option<CacheSnapshot> {
    let content = match store.load(key).await {
        Ok(Some(content)) => content,
        Ok(None) => {
            debug!("No persisted news snapshot under '{}'", key);
            return None;
        }
        Err(e) => {
            warn!("Failed to load persisted news snapshot: {}", e);
            return None;
        }
    };

    match CacheSnapshot::from_json(&content) {
        Ok(snapshot) => {
            info!("Loaded persisted news snapshot: {} items", snapshot.items.len());
            Some(snapshot)
        }
        Err(e) => {
            warn!("Ignoring corrupt persisted news snapshot: {}", e);
            None
        }
    }
}

/// Timestamp for a new generation: now, but strictly after the previous one
/// so generated ids never repeat.
fn next_epoch(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + ChronoDuration::milliseconds(1),
        _ => now,
    }
}
