// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Keyed query cache with freshness windows, retries and single-flight fetches
//!
//! Each entry moves through `Empty -> Fetching -> Fresh -> Stale -> Fetching`.
//! A read of a stale entry returns the previous value immediately and starts a
//! background refresh. A failed first load is returned to the caller and
//! nothing is stored. A failed refresh keeps the previous value and exposes
//! the error next to it until the next successful fetch.

use std::{
    fmt,
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace, warn};
use utoipa::ToSchema;

use crate::{
    CacheOperation, CacheRead, FreshnessPolicy, OutcomeObserver, ResourceKind, RetryPolicy,
    ServiceError,
    single_flight::{FlightResult, SharedFlight, SingleFlight},
};

/// Cached value with its fetch and access times
#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    fetched_at: Instant,
    last_accessed: Instant,
    last_error: Option<Arc<ServiceError>>,
    invalidated: bool,
}

impl<V> CacheEntry<V> {
    fn new(value: Arc<V>) -> Self {
        let now = Instant::now();
        Self {
            value,
            fetched_at: now,
            last_accessed: now,
            last_error: None,
            invalidated: false,
        }
    }

    fn replace(&mut self, value: Arc<V>) {
        self.value = value;
        self.fetched_at = Instant::now();
        self.last_error = None;
        self.invalidated = false;
    }

    fn accessed(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CacheStats {
    /// Reads served from a fresh value
    pub hits: u64,
    /// Reads served from a stale value
    pub stale_hits: u64,
    /// Reads that found no value
    pub misses: u64,
    /// Upstream fetches started
    pub fetches: u64,
    /// Fetches that failed after their retries
    pub fetch_failures: u64,
    /// Entries removed for being unused
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
    /// Fetches currently running
    pub in_flight: usize,
}

struct CacheInner<K, V> {
    resource: ResourceKind,
    entries: DashMap<K, CacheEntry<V>>,
    flights: SingleFlight<K, V>,
    freshness: FreshnessPolicy,
    retry: RetryPolicy,
    gc_after: Duration,
    stats: DashMap<&'static str, u64>,
    observer: Arc<dyn OutcomeObserver>,
}

impl<K, V> CacheInner<K, V> {
    fn record(&self, operation: CacheOperation) {
        *self.stats.entry(operation.as_str()).or_insert(0) += 1;
        self.observer.cache_operation(self.resource, operation);
    }

    fn stat(&self, operation: CacheOperation) -> u64 {
        self.stats.get(operation.as_str()).map_or(0, |value| *value)
    }
}

/// Cache for one resource kind, keyed by `K`
///
/// Cloning is cheap and every clone shares the same entries.
pub struct QueryCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for QueryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("resource", &self.inner.resource)
            .field("entries", &self.inner.entries.len())
            .field("freshness", &self.inner.freshness)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create an empty cache
    pub fn new(
        resource: ResourceKind,
        freshness: FreshnessPolicy,
        retry: RetryPolicy,
        gc_after: Duration,
        observer: Arc<dyn OutcomeObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                resource,
                entries: DashMap::new(),
                flights: SingleFlight::new(),
                freshness,
                retry,
                gc_after,
                stats: DashMap::new(),
                observer,
            }),
        }
    }

    /// Resource kind held by this cache
    pub fn resource(&self) -> ResourceKind {
        self.inner.resource
    }

    /// Read `key`, fetching through `fetcher` when absent or stale
    ///
    /// A fresh value is returned untouched. A stale value is returned at once
    /// while a background refresh runs. When nothing is cached the caller
    /// waits for the fetch, retried per the cache's [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns the fetch error when no value has ever been cached for `key`
    pub async fn get<F, Fut>(&self, key: K, fetcher: F) -> Result<CacheRead<V>, Arc<ServiceError>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        if let Some(read) = self.read_cached(&key) {
            if read.stale {
                self.inner.record(CacheOperation::StaleHit);
                debug!(resource = %self.inner.resource, ?key, "serving stale value, refreshing");
                drop(self.start_fetch(key, fetcher, self.inner.retry));
            } else {
                self.inner.record(CacheOperation::Hit);
                trace!(resource = %self.inner.resource, ?key, "cache hit");
            }
            return Ok(read);
        }

        self.inner.record(CacheOperation::Miss);
        debug!(resource = %self.inner.resource, ?key, "cache miss");
        let value = self.start_fetch(key, fetcher, self.inner.retry).await?;
        Ok(CacheRead {
            value,
            stale: false,
            error: None,
            age: Duration::ZERO,
        })
    }

    /// Fetch `key` now regardless of freshness, without retries
    ///
    /// Joins a fetch that is already running for `key` instead of starting a
    /// second one.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; a previously cached value is kept
    pub async fn refresh<F, Fut>(&self, key: K, fetcher: F) -> FlightResult<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        self.start_fetch(key, fetcher, RetryPolicy::none()).await
    }

    /// Cached value for `key` without fetching or counting a read
    pub fn peek(&self, key: &K) -> Option<CacheRead<V>> {
        let entry = self.inner.entries.get(key)?;
        Some(self.to_read(&entry))
    }

    /// The fetch currently running for `key`, if any
    pub fn in_flight(&self, key: &K) -> Option<SharedFlight<V>> {
        self.inner.flights.get(key)
    }

    /// Mark the value for `key` stale so the next read refreshes it
    pub fn invalidate(&self, key: &K) {
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            trace!(resource = %self.inner.resource, ?key, "entry invalidated");
            entry.invalidated = true;
        }
    }

    /// Drop entries not read within the garbage collection window
    pub fn cleanup_unused(&self) -> usize {
        let gc_after = self.inner.gc_after;
        let before = self.inner.entries.len();
        self.inner
            .entries
            .retain(|_, entry| entry.last_accessed.elapsed() < gc_after);
        let removed = before.saturating_sub(self.inner.entries.len());
        for _ in 0..removed {
            self.inner.record(CacheOperation::Evict);
        }
        if removed > 0 {
            debug!(resource = %self.inner.resource, removed, "removed unused cache entries");
        }
        removed
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Snapshot of the cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = &self.inner;
        CacheStats {
            hits: inner.stat(CacheOperation::Hit),
            stale_hits: inner.stat(CacheOperation::StaleHit),
            misses: inner.stat(CacheOperation::Miss),
            fetches: inner.stat(CacheOperation::Fetch),
            fetch_failures: inner.stat(CacheOperation::FetchFailure),
            evictions: inner.stat(CacheOperation::Evict),
            entries: inner.entries.len(),
            in_flight: inner.flights.len(),
        }
    }

    fn read_cached(&self, key: &K) -> Option<CacheRead<V>> {
        let mut entry = self.inner.entries.get_mut(key)?;
        entry.accessed();
        Some(self.to_read(&entry))
    }

    fn to_read(&self, entry: &CacheEntry<V>) -> CacheRead<V> {
        CacheRead {
            value: Arc::clone(&entry.value),
            stale: entry.invalidated || !self.inner.freshness.is_fresh(entry.fetched_at),
            error: entry.last_error.clone(),
            age: entry.fetched_at.elapsed(),
        }
    }

    fn start_fetch<F, Fut>(&self, key: K, fetcher: F, retry: RetryPolicy) -> SharedFlight<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ServiceError>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let (flight, _) = self.inner.flights.join_or_start(key.clone(), move || async move {
            inner.record(CacheOperation::Fetch);
            match retry.run(inner.resource, &fetcher).await {
                Ok(value) => {
                    let value = Arc::new(value);
                    inner
                        .entries
                        .entry(key)
                        .and_modify(|entry| entry.replace(Arc::clone(&value)))
                        .or_insert_with(|| CacheEntry::new(Arc::clone(&value)));
                    Ok(value)
                }
                Err(error) => {
                    let error = Arc::new(error);
                    inner.record(CacheOperation::FetchFailure);
                    if let Some(mut entry) = inner.entries.get_mut(&key) {
                        warn!(
                            resource = %inner.resource,
                            ?key,
                            error = %error,
                            "refresh failed, keeping previous value"
                        );
                        entry.last_error = Some(Arc::clone(&error));
                    } else {
                        warn!(resource = %inner.resource, ?key, error = %error, "first load failed");
                    }
                    Err(error)
                }
            }
        });
        flight
    }
}
