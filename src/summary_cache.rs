//! # Summary Cache Module
//!
//! Process-wide store of generated endpoint summaries with time-based expiry.
//!
//! ## Overview
//!
//! Generating a summary is a slow, metered call to an external service.
//! Regenerating documentation for the same schema (or a schema that shares
//! endpoints with a previous upload) should not pay that cost twice within
//! the TTL window.
//!
//! ## Expiry
//!
//! Two mechanisms, both always active:
//!
//! - **Lazy**: [`SummaryCache::get`] treats an entry older than the TTL as
//!   absent, whether or not a sweep has run.
//! - **Sweep**: [`SummaryCache::sweep`] removes expired entries.
//!   [`SummaryCache::spawn_sweeper`] runs it on a fixed period (one hour by
//!   default) to bound memory.
//!
//! ## Cache Key Structure
//!
//! Keys are `{METHOD}-{path}-{prefix}` where `prefix` is the first
//! [`CACHE_KEY_PREFIX_LEN`] characters of the endpoint's JSON serialization.
//! Two different endpoints that agree on method, path and that prefix share
//! a key; this is accepted.
//!
//! ## Thread Safety
//!
//! `Arc<RwLock<HashMap>>` inside, `Clone` outside. Locks are never held
//! across an `.await`.

use crate::spec::EndpointDescriptor;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default entry lifetime: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default period of the background sweep: one hour.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Number of characters of the serialized endpoint that go into a cache key.
pub const CACHE_KEY_PREFIX_LEN: usize = 100;

/// Build the cache key for an endpoint.
///
/// # Example
///
/// ```rust
/// use apidocgen::spec::{EndpointDescriptor, HttpMethod};
/// use apidocgen::summary_cache::cache_key;
///
/// let endpoint = EndpointDescriptor::new(HttpMethod::Get, "/pets");
/// assert!(cache_key(&endpoint).starts_with("GET-/pets-{"));
/// ```
pub fn cache_key(endpoint: &EndpointDescriptor) -> String {
    let serialized = serde_json::to_string(endpoint).unwrap_or_default();
    let prefix: String = serialized.chars().take(CACHE_KEY_PREFIX_LEN).collect();
    format!("{}-{}-{}", endpoint.method, endpoint.path, prefix)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    summary: String,
    stored_at: Instant,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// Thread-safe, TTL-bounded summary store.
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct SummaryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SummaryCache {
    pub fn new(ttl: Duration) -> Self {
        info!(ttl_secs = ttl.as_secs(), "Initializing summary cache");
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) >= self.ttl
    }

    /// Look up a summary; expired entries read as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match guard.get(key) {
            Some(entry) if !self.is_expired(entry, now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Summary cache hit");
                Some(entry.summary.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store (or replace) a summary, stamping it with the current time.
    pub fn put(&self, key: impl Into<String>, summary: impl Into<String>) {
        let entry = CacheEntry {
            summary: summary.into(),
            stored_at: Instant::now(),
        };
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.into(), entry);
    }

    /// Remove every expired entry. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - guard.len();
        if evicted > 0 {
            debug!(evicted, remaining = guard.len(), "Swept expired summaries");
        }
        evicted
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    /// Run [`sweep`](Self::sweep) every `period` until `shutdown` is cancelled.
    ///
    /// The first sweep happens one full period after spawning. Must be called
    /// from within a Tokio runtime.
    pub fn spawn_sweeper(&self, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Summary cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.sweep();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_cache_key_is_bounded_and_shape_sensitive() {
        let mut a = EndpointDescriptor::new(HttpMethod::Post, "/orders");
        let b = a.clone();
        a.summary = Some("Create".into());

        let key_a = cache_key(&a);
        let key_b = cache_key(&b);
        assert_ne!(key_a, key_b);
        assert!(key_a.starts_with("POST-/orders-"));

        a.description = Some("x".repeat(10_000));
        let prefix_len = cache_key(&a).chars().count() - "POST-/orders-".len();
        assert_eq!(prefix_len, CACHE_KEY_PREFIX_LEN);
    }

    #[test]
    fn test_cache_key_collision_past_prefix() {
        // Differences beyond the prefix share a key.
        let mut a = EndpointDescriptor::new(HttpMethod::Get, "/reports");
        a.description = Some("d".repeat(200));
        let mut b = a.clone();
        a.responses = Some(json!({"200": {}}).as_object().cloned().unwrap_or_default());
        b.responses = Some(json!({"404": {}}).as_object().cloned().unwrap_or_default());
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_put_and_lazy_expiry() {
        let cache = SummaryCache::new(Duration::from_secs(60));
        cache.put("k", "summary");
        assert_eq!(cache.get("k").as_deref(), Some("summary"));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k").as_deref(), Some("summary"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        // still stored until swept
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired() {
        let cache = SummaryCache::new(Duration::from_secs(60));
        cache.put("old", "a");
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.put("new", "b");
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new").as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_runs_on_period() {
        let cache = SummaryCache::new(Duration::from_secs(10));
        let shutdown = CancellationToken::new();
        let handle = cache.spawn_sweeper(Duration::from_secs(60), shutdown.clone());

        cache.put("k", "v");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.len(), 1, "no sweep before the first period");

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(cache.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = SummaryCache::default();
        let other = cache.clone();
        other.put("k", "v");
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        cache.clear();
        assert!(other.is_empty());
    }
}
