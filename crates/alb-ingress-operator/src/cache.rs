//! Expiring cache for remote API lookups
//!
//! Slowly-changing remote attributes (such as the VPC of a subnet) are cached
//! per key with an expiry so repeated reconciliation passes do not hit the
//! remote API every time. The cache is shared across concurrent reconcilers
//! and bounded in size; expired entries are evicted by moka.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use tracing::debug;

use crate::metrics::{record_cache_lookup, CacheOutcome};

/// Default upper bound on cached entries
pub const DEFAULT_MAX_ENTRIES: u64 = 1024;

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with
struct PerEntryTtl;

impl<V> Expiry<String, CachedEntry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CachedEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Hit/miss counters of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Keyed cache with per-entry expiry
pub struct ApiCache<V> {
    /// Label used for metrics
    name: &'static str,
    entries: Cache<String, CachedEntry<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> ApiCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self::with_capacity(name, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(name: &'static str, max_entries: u64) -> Self {
        Self {
            name,
            entries: Cache::builder()
                .name(name)
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get a live entry
    pub async fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).await.map(|entry| entry.value)
    }

    /// Store a value that expires after `ttl`
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries
            .insert(key.into(), CachedEntry { value, ttl })
            .await;
    }

    /// Read-through lookup.
    ///
    /// Returns the cached value and counts a hit, or runs `fetch`, stores its
    /// result for `ttl` and counts a miss. Concurrent misses on one key share
    /// a single fetch; the callers that waited on it count as hits. Fetch
    /// errors are returned to every waiter and nothing is cached.
    pub async fn get_or_try_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
        E: Clone + Send + Sync + 'static,
    {
        let init = async move { fetch().await.map(|value| CachedEntry { value, ttl }) };
        let entry = self
            .entries
            .entry_by_ref(key)
            .or_try_insert_with(init)
            .await
            .map_err(|e: Arc<E>| (*e).clone())?;

        if entry.is_fresh() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            record_cache_lookup(self.name, CacheOutcome::Miss);
            debug!(
                cache = self.name,
                key = %key,
                ttl_secs = ttl.as_secs(),
                "Cache miss, stored"
            );
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            record_cache_lookup(self.name, CacheOutcome::Hit);
            debug!(cache = self.name, key = %key, "Cache hit");
        }
        Ok(entry.into_value().value)
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        self.entries.iter().count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> std::fmt::Debug for ApiCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCache")
            .field("name", &self.name)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
