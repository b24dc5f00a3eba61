//! TTL caches shared by concurrent requests.
//!
//! Entries are evicted lazily: a lookup that finds a stale entry removes it
//! and reports a miss. [`SearchCaches`] owns the pipeline-result cache and
//! the synthesized-response cache and is injected into the service rather
//! than living in process-wide statics.

use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use ruedas_core::model::Language;

use crate::service::SearchResponse;

/// A cached value with its insertion time and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

/// A concurrent map whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fresh value for `key`, if any. Stale entries are removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        })?;
        if hit.is_none() {
            // Re-check under the write lock; another request may have
            // refreshed the entry in between.
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        hit
    }

    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Return the cached value, or compute, store and return a new one.
    ///
    /// Errors are returned to the caller and never cached.
    pub async fn get_or_try_compute<E, F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Key of the synthesized-response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub language: Language,
    pub result_count: usize,
    pub normalized_query: String,
}

/// The two caches the pipeline reads and writes.
#[derive(Debug)]
pub struct SearchCaches {
    /// Full responses keyed by normalized query text.
    pub pipeline: TtlCache<String, SearchResponse>,
    /// Synthesized response text.
    pub responses: TtlCache<ResponseKey, String>,
}

impl SearchCaches {
    pub fn new(pipeline_ttl: Duration, response_ttl: Duration) -> Self {
        Self {
            pipeline: TtlCache::new(pipeline_ttl),
            responses: TtlCache::new(response_ttl),
        }
    }

    /// Drop every entry from both caches.
    pub fn clear(&self) {
        let dropped = self.pipeline.len() + self.responses.len();
        self.pipeline.clear();
        self.responses.clear();
        log::info!("Cleared {} cached entries", dropped);
    }
}
