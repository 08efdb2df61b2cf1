//! HTTP client for making requests to SearXNG instances

use super::payload::BackendPayload;
use super::traits::SearchBackend;
use crate::config::BackendSettings;
use crate::endpoints::Endpoint;
use crate::error::FailureKind;
use crate::query::Query;
use crate::results::ResultSet;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a `/healthz` probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Unreachable,
}

/// HTTP client wrapper for the SearXNG JSON API
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    user_agent: String,
}

impl BackendClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&BackendSettings::default())
    }

    /// Create a new client with custom settings
    pub fn with_settings(settings: &BackendSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: format!("searxng-gateway/{}", crate::VERSION),
        })
    }

    /// Backend query parameters for `query`
    pub fn search_params(query: &Query) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.text.clone()),
            ("format", "json".to_string()),
            ("categories", query.category.as_str().to_string()),
            ("language", query.language.clone()),
            ("safesearch", query.safesearch.code().to_string()),
            ("pageno", query.pageno.to_string()),
        ]
    }

    async fn fetch_inner(
        &self,
        endpoint: &Endpoint,
        query: &Query,
        timeout: Duration,
    ) -> Result<ResultSet, FailureKind> {
        let start = Instant::now();

        let response = self
            .client
            .get(endpoint.search_url())
            .timeout(timeout)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .query(&Self::search_params(query))
            .send()
            .await
            .map_err(|e| classify(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureKind::BackendError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(endpoint, &e))?;
        let elapsed = start.elapsed().as_secs_f64();

        let payload = BackendPayload::parse(&body).map_err(|e| {
            warn!("Malformed response from {}: {}", endpoint.url(), e);
            FailureKind::MalformedResponse
        })?;

        Ok(payload.into_result_set(query, elapsed))
    }

    /// Probe an endpoint's `/healthz` route
    pub async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> ProbeStatus {
        let request = self
            .client
            .get(endpoint.healthz_url())
            .timeout(timeout)
            .header(USER_AGENT, &self.user_agent)
            .send();

        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => ProbeStatus::Healthy,
            Ok(Ok(_)) => ProbeStatus::Unhealthy,
            Ok(Err(_)) | Err(_) => ProbeStatus::Unreachable,
        }
    }
}

/// Map a transport error to a failure kind
fn classify(endpoint: &Endpoint, error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else {
        warn!("Request to {} failed: {}", endpoint.url(), error);
        FailureKind::Network
    }
}

#[async_trait]
impl SearchBackend for BackendClient {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        query: &Query,
        timeout: Duration,
    ) -> Result<ResultSet, FailureKind> {
        debug!(
            "Fetching '{}' from {} with timeout {:?}",
            query.text,
            endpoint.url(),
            timeout
        );

        // Hard deadline over send + body read.
        match tokio::time::timeout(timeout, self.fetch_inner(endpoint, query, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FailureKind::Timeout),
        }
    }
}
