//! Backend abstraction used by the failover coordinator

use crate::endpoints::Endpoint;
use crate::error::FailureKind;
use crate::query::Query;
use crate::results::ResultSet;
use async_trait::async_trait;
use std::time::Duration;

/// Something that can answer a query against one endpoint
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Issue exactly one search request to `endpoint`.
    ///
    /// Must not outlive `timeout`, and must not touch endpoint health.
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        query: &Query,
        timeout: Duration,
    ) -> Result<ResultSet, FailureKind>;
}
