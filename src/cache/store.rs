//! Key/value stores behind the result cache

use crate::error::CacheUnavailable;
use crate::results::ResultSet;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// TTL-aware key/value store for result sets
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short name reported by the health route
    fn name(&self) -> &str;

    /// Fetch an unexpired entry
    async fn get(&self, key: &str) -> Result<Option<ResultSet>, CacheUnavailable>;

    /// Store an entry for `ttl`
    async fn put(&self, key: String, value: ResultSet, ttl: Duration)
        -> Result<(), CacheUnavailable>;

    /// Check that the store can serve requests
    async fn ping(&self) -> Result<(), CacheUnavailable> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: ResultSet,
    ttl: Duration,
    expires_at: Instant,
}

/// Per-entry expiry policy
struct EntryTtl;

impl Expiry<String, CachedEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process store backed by moka
pub struct MemoryStore {
    cache: Cache<String, CachedEntry>,
}

impl MemoryStore {
    /// Create a store holding at most `max_capacity` entries
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self { cache }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<ResultSet>, CacheUnavailable> {
        match self.cache.get(key).await {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value)),
            Some(_) => {
                self.cache.invalidate(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: String,
        value: ResultSet,
        ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheUnavailable(format!("ttl out of range: {:?}", ttl)))?;
        let entry = CachedEntry {
            value,
            ttl,
            expires_at,
        };
        self.cache.insert(key, entry).await;
        Ok(())
    }
}
