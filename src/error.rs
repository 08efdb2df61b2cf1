//! Error taxonomy for backend attempts, whole searches and the cache

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single attempt against one endpoint failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// No complete response before the per-attempt timeout
    #[error("request timed out")]
    Timeout,
    /// Backend answered with a status outside 200..=299
    #[error("backend returned HTTP {status}")]
    BackendError { status: u16 },
    /// Body was not the expected JSON shape
    #[error("malformed backend response")]
    MalformedResponse,
    /// Connection could not be established or was dropped
    #[error("network error")]
    Network,
    /// Overall request deadline ran out before or during this attempt
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Outcome of one failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// Endpoint base URL
    pub endpoint: String,
    /// What went wrong
    #[serde(flatten)]
    pub kind: FailureKind,
}

impl Attempt {
    pub fn new(endpoint: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
        }
    }
}

/// Request-level search failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Every candidate endpoint failed; one entry per candidate, in attempt order
    #[error("all {} endpoints failed", .attempts.len())]
    AllEndpointsFailed { attempts: Vec<Attempt> },
}

impl SearchError {
    /// Per-endpoint outcomes
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::AllEndpointsFailed { attempts } => attempts,
        }
    }

    /// Whether the overall deadline cut the search short
    pub fn deadline_exceeded(&self) -> bool {
        self.attempts()
            .iter()
            .any(|a| a.kind == FailureKind::DeadlineExceeded)
    }
}

/// The cache store could not be reached; always recovered as a miss
#[derive(Debug, Clone, Error)]
#[error("cache unavailable: {0}")]
pub struct CacheUnavailable(pub String);
