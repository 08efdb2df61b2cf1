//! Metrics collection module
//!
//! Tracks searches, cache effectiveness and per-endpoint attempt outcomes.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Global metrics collector
pub struct Metrics {
    /// Total search count
    pub total_searches: AtomicU64,
    /// Searches answered from cache
    pub cache_hits: AtomicU64,
    /// Searches that missed the cache
    pub cache_misses: AtomicU64,
    /// Cache store faults recovered as misses
    pub cache_errors: AtomicU64,
    /// Searches where every endpoint failed
    pub failed_searches: AtomicU64,
    /// Per-endpoint counters
    endpoints: RwLock<HashMap<String, EndpointCounters>>,
}

#[derive(Debug, Clone, Default)]
struct EndpointCounters {
    attempts: u64,
    successes: u64,
    failures: u64,
    /// Last 100 successful response times in ms
    response_times: Vec<u64>,
}

impl EndpointCounters {
    fn reliability(&self) -> f64 {
        if self.attempts == 0 {
            100.0
        } else {
            (self.successes as f64 / self.attempts as f64) * 100.0
        }
    }
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            cache_errors: AtomicU64::new(0),
            failed_searches: AtomicU64::new(0),
            endpoints: RwLock::new(HashMap::new()),
        }
    }

    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_search(&self) {
        self.failed_searches.fetch_add(1, Ordering::Relaxed);
    }

    fn with_endpoint<F: FnOnce(&mut EndpointCounters)>(&self, endpoint: &str, f: F) {
        let mut endpoints = self
            .endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(endpoints.entry(endpoint.to_string()).or_default());
    }

    /// Record a successful attempt and its response time
    pub fn record_success(&self, endpoint: &str, time_ms: u64) {
        self.with_endpoint(endpoint, |c| {
            c.attempts += 1;
            c.successes += 1;
            if c.response_times.len() >= 100 {
                c.response_times.remove(0);
            }
            c.response_times.push(time_ms);
        });
    }

    /// Record a failed attempt
    pub fn record_failure(&self, endpoint: &str) {
        self.with_endpoint(endpoint, |c| {
            c.attempts += 1;
            c.failures += 1;
        });
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let endpoints = self.endpoints.read().unwrap_or_else(PoisonError::into_inner);

        let mut endpoint_stats: Vec<EndpointStats> = endpoints
            .iter()
            .map(|(name, c)| EndpointStats {
                endpoint: name.clone(),
                attempts: c.attempts,
                successes: c.successes,
                failures: c.failures,
                avg_response_time: if c.response_times.is_empty() {
                    None
                } else {
                    Some(c.response_times.iter().sum::<u64>() / c.response_times.len() as u64)
                },
                reliability: c.reliability(),
            })
            .collect();
        endpoint_stats.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

        MetricsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            failed_searches: self.failed_searches.load(Ordering::Relaxed),
            endpoints: endpoint_stats,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of [`Metrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub failed_searches: u64,
    pub endpoints: Vec<EndpointStats>,
}

/// Statistics for a single endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
