//! Cache-then-failover search path used by the HTTP handlers

use super::coordinator::Coordinator;
use crate::cache::ResultCache;
use crate::error::SearchError;
use crate::metrics::Metrics;
use crate::query::Query;
use crate::results::ResultSet;
use std::sync::Arc;
use tracing::debug;

/// Search entry point: cache lookup, coordinator on miss, cache fill
pub struct SearchService {
    coordinator: Coordinator,
    cache: Option<ResultCache>,
    metrics: Arc<Metrics>,
}

impl SearchService {
    /// Create a service; `cache = None` disables caching
    pub fn new(
        coordinator: Coordinator,
        cache: Option<ResultCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            coordinator,
            cache,
            metrics,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Execute a search
    pub async fn search(&self, query: &Query) -> Result<ResultSet, SearchError> {
        self.metrics.inc_search();
        let query = query.canonicalize();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&query).await {
                return Ok(hit);
            }
        }

        let set = match self.coordinator.search(&query).await {
            Ok(set) => set,
            Err(e) => {
                self.metrics.inc_failed_search();
                return Err(e);
            }
        };

        if let Some(cache) = &self.cache {
            cache.put(&query, &set).await;
            debug!("Cached {} results for '{}'", set.len(), query.text);
        }

        Ok(set)
    }
}
