//! Application state shared across handlers

use crate::cache::ResultCache;
use crate::config::Settings;
use crate::endpoints::EndpointPool;
use crate::metrics::Metrics;
use crate::network::BackendClient;
use crate::search::{Coordinator, FailoverPolicy, SearchService};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Cache + failover search path
    pub search: Arc<SearchService>,
    /// Client used for health probes
    pub client: BackendClient,
}

impl AppState {
    /// Wire the search path from settings
    pub fn new(settings: Settings, client: BackendClient) -> Self {
        let metrics = Arc::new(Metrics::new());
        let pool = EndpointPool::from_config(&settings.backend.endpoints);
        let coordinator = Coordinator::new(pool, Arc::new(client.clone()), metrics.clone())
            .with_policy(FailoverPolicy::from_settings(&settings.backend));

        let cache = settings
            .cache
            .enabled
            .then(|| ResultCache::from_settings(&settings.cache, metrics.clone()));

        let search = SearchService::new(coordinator, cache, metrics);
        Self::from_parts(settings, search, client)
    }

    /// Build state around an already assembled search service
    pub fn from_parts(settings: Settings, search: SearchService, client: BackendClient) -> Self {
        Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            client,
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Cache mode reported to clients
    pub fn cache_mode(&self) -> &str {
        self.search
            .cache()
            .map(|c| c.store_name())
            .unwrap_or("disabled")
    }
}
