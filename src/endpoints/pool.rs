//! Ordered endpoint pool

use super::endpoint::Endpoint;
use crate::config::EndpointConfig;
use std::sync::Arc;
use std::time::Duration;

/// The configured endpoints, in configuration order
#[derive(Debug, Clone, Default)]
pub struct EndpointPool {
    endpoints: Vec<Arc<Endpoint>>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            endpoints: endpoints.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build the pool from configuration
    pub fn from_config(configs: &[EndpointConfig]) -> Self {
        Self::new(
            configs
                .iter()
                .map(|c| Endpoint::new(c.url.clone(), c.region.clone()))
                .collect(),
        )
    }

    /// Per-request candidate order.
    ///
    /// Configuration order, with endpoints that are inside their cool-down
    /// window moved to the back. Both groups keep configuration order.
    pub fn candidates(&self, cooldown: Duration, now_ms: i64) -> Vec<Arc<Endpoint>> {
        let (cooling, ready): (Vec<_>, Vec<_>) = self
            .endpoints
            .iter()
            .cloned()
            .partition(|e| e.is_cooling_down(cooldown, now_ms));

        ready.into_iter().chain(cooling).collect()
    }

    pub fn all(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(urls: &[&str]) -> EndpointPool {
        EndpointPool::new(urls.iter().map(|u| Endpoint::new(*u, None)).collect())
    }

    fn urls(candidates: &[Arc<Endpoint>]) -> Vec<&str> {
        candidates.iter().map(|e| e.url()).collect()
    }

    #[test]
    fn test_default_order_is_configuration_order() {
        let pool = pool(&["http://a", "http://b", "http://c"]);
        let candidates = pool.candidates(Duration::from_secs(60), 1_000);
        assert_eq!(urls(&candidates), vec!["http://a", "http://b", "http://c"]);
    }

    #[test]
    fn test_cooling_endpoints_are_tried_last_in_stable_order() {
        let pool = pool(&["http://a", "http://b", "http://c", "http://d"]);
        pool.all()[0].mark_failure(1, 1_000);
        pool.all()[2].mark_failure(1, 1_000);

        let candidates = pool.candidates(Duration::from_secs(60), 2_000);
        assert_eq!(
            urls(&candidates),
            vec!["http://b", "http://d", "http://a", "http://c"]
        );
    }

    #[test]
    fn test_cooldown_expiry_restores_order() {
        let pool = pool(&["http://a", "http://b"]);
        pool.all()[0].mark_failure(1, 1_000);

        let candidates = pool.candidates(Duration::from_secs(1), 5_000);
        assert_eq!(urls(&candidates), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_from_config() {
        let configs = vec![
            EndpointConfig {
                url: "http://a/".to_string(),
                region: Some("us".to_string()),
            },
            EndpointConfig {
                url: "http://b".to_string(),
                region: None,
            },
        ];
        let pool = EndpointPool::from_config(&configs);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.all()[0].url(), "http://a");
        assert_eq!(pool.all()[0].region(), Some("us"));
    }
}
