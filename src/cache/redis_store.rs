//! Redis-backed store, shared between gateway instances

use super::CacheStore;
use crate::error::CacheUnavailable;
use crate::results::ResultSet;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Result sets stored as JSON text under their cache key, expired by Redis
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<ConnectionManager>>,
    timeout: Duration,
}

impl RedisStore {
    /// Create a store for `url`; the connection is opened on first use.
    ///
    /// Every command, including the initial connect, is bounded by `timeout`.
    pub fn open(url: &str, timeout: Duration) -> Result<Self, CacheUnavailable> {
        let client = Client::open(url).map_err(unavailable)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheUnavailable> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .bounded(ConnectionManager::new(self.client.clone()))
            .await?;
        info!("Connected to Redis cache");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheUnavailable>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(unavailable),
            Err(_) => Err(CacheUnavailable(format!(
                "redis did not answer within {:?}",
                self.timeout
            ))),
        }
    }
}

fn unavailable(e: RedisError) -> CacheUnavailable {
    CacheUnavailable(e.to_string())
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<ResultSet>, CacheUnavailable> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let raw: Option<String> = self.bounded(cmd.query_async(&mut conn)).await?;

        match raw {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| CacheUnavailable(format!("unreadable entry {}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: String,
        value: ResultSet,
        ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        let payload =
            serde_json::to_string(&value).map_err(|e| CacheUnavailable(e.to_string()))?;

        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SETEX");
        cmd.arg(&key).arg(ttl.as_secs().max(1)).arg(payload);
        let _: () = self.bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheUnavailable> {
        let mut conn = self.connection().await?;
        let cmd = redis::cmd("PING");
        let _: String = self.bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }
}
