//! SearXNG-Gateway: a failover and caching HTTP wrapper for SearXNG
//!
//! Search requests are normalized into a [`Query`], served from the result
//! cache when possible, and otherwise forwarded to the first configured
//! SearXNG instance that answers in time.

pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod metrics;
pub mod network;
pub mod query;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use error::{Attempt, FailureKind, SearchError};
pub use query::{Category, Query, SafeSearch};
pub use results::{ResultSet, SearchResult};
pub use search::{Coordinator, SearchService};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
