//! Caching module for SearXNG-Gateway
//!
//! Maps canonical queries to previously normalized result sets. The cache is
//! an optimization only: store faults are logged, counted and treated as a
//! miss, never surfaced to the caller.

mod redis_store;
mod store;

pub use redis_store::RedisStore;
pub use store::{CacheStore, MemoryStore};

use crate::config::CacheSettings;
use crate::metrics::Metrics;
use crate::query::Query;
use crate::results::ResultSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache for search results
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    metrics: Arc<Metrics>,
}

impl ResultCache {
    /// Create a result cache over `store` with the given entry TTL
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            ttl,
            metrics,
        }
    }

    /// In-memory cache with the given TTL and capacity
    pub fn in_memory(ttl: Duration, max_capacity: u64, metrics: Arc<Metrics>) -> Self {
        Self::new(Arc::new(MemoryStore::new(max_capacity)), ttl, metrics)
    }

    /// Cache configured by `settings`: Redis when `redis_url` is set,
    /// in-process otherwise
    pub fn from_settings(settings: &CacheSettings, metrics: Arc<Metrics>) -> Self {
        if let Some(url) = &settings.redis_url {
            match RedisStore::open(url, settings.redis_timeout()) {
                Ok(store) => return Self::new(Arc::new(store), settings.ttl(), metrics),
                Err(e) => warn!("Redis cache unusable, falling back to memory: {}", e),
            }
        }
        Self::in_memory(settings.ttl(), settings.max_capacity, metrics)
    }

    /// Whether the store currently answers
    pub async fn is_reachable(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Cache store {} unreachable: {}", self.store.name(), e);
                false
            }
        }
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Look up a query; hits come back with `cached = true`
    pub async fn get(&self, query: &Query) -> Option<ResultSet> {
        let key = query.cache_key();

        match self.store.get(&key).await {
            Ok(Some(set)) => {
                debug!("Cache hit for {}", key);
                self.metrics.inc_cache_hit();
                Some(set.into_cached())
            }
            Ok(None) => {
                self.metrics.inc_cache_miss();
                None
            }
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {}", e);
                self.metrics.inc_cache_error();
                self.metrics.inc_cache_miss();
                None
            }
        }
    }

    /// Store a freshly fetched result set
    pub async fn put(&self, query: &Query, set: &ResultSet) {
        let key = query.cache_key();
        let mut stored = set.clone();
        stored.cached = false;

        if let Err(e) = self.store.put(key, stored, self.ttl).await {
            warn!("Cache store failed, skipping write: {}", e);
            self.metrics.inc_cache_error();
        }
    }
}
