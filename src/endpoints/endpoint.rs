//! A single backend endpoint and its health metadata.
//!
//! # State Transitions
//! ```text
//! any       → Healthy:   successful attempt
//! any       → Degraded:  failed attempt, consecutive failures < threshold
//! any       → Unhealthy: consecutive failures >= threshold
//! ```
//!
//! Health fields are plain atomics with relaxed ordering. Concurrent
//! updates may interleave; the state only steers candidate ordering.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::time::Duration;

/// Last-known health of an endpoint
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Degraded = 2,
    Unhealthy = 3,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Degraded,
            3 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// One SearXNG instance
#[derive(Debug)]
pub struct Endpoint {
    /// Base URL, without trailing slash
    url: String,
    /// Optional region label
    region: Option<String>,
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    /// Milliseconds since the Unix epoch; 0 = never failed
    last_failure_ms: AtomicI64,
}

impl Endpoint {
    /// Create an endpoint in the `Unknown` state
    pub fn new(url: impl Into<String>, region: Option<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            url,
            region,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicU32::new(0),
            last_failure_ms: AtomicI64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// URL of the backend search route
    pub fn search_url(&self) -> String {
        format!("{}/search", self.url)
    }

    /// URL of the backend liveness route
    pub fn healthz_url(&self) -> String {
        format!("{}/healthz", self.url)
    }

    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Timestamp of the last recorded failure, if any
    pub fn last_failure_ms(&self) -> Option<i64> {
        match self.last_failure_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    /// Record a successful attempt
    pub fn mark_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
    }

    /// Record a failed attempt at `now_ms`; returns the resulting state
    pub fn mark_failure(&self, unhealthy_threshold: u32, now_ms: i64) -> HealthState {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_failure_ms.store(now_ms, Ordering::Relaxed);

        let next = if failures >= unhealthy_threshold.max(1) {
            HealthState::Unhealthy
        } else {
            HealthState::Degraded
        };
        self.state.store(next as u8, Ordering::Relaxed);
        next
    }

    /// Unhealthy and failed within the last `cooldown`
    pub fn is_cooling_down(&self, cooldown: Duration, now_ms: i64) -> bool {
        if self.state() != HealthState::Unhealthy {
            return false;
        }
        match self.last_failure_ms() {
            Some(last) => now_ms.saturating_sub(last) < cooldown.as_millis() as i64,
            None => false,
        }
    }
}
