//! HTTP request handlers

use super::state::AppState;
use crate::config::SearchSettings;
use crate::endpoints::HealthState;
use crate::error::{Attempt, SearchError};
use crate::network::ProbeStatus;
use crate::query::{Category, Query as SearchQuery, SafeSearch};
use crate::results::ResultSet;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Query parameters for the search routes
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Category (only read by `/search`)
    pub category: Option<String>,
    /// Number of results
    pub limit: Option<u32>,
    /// Safe search level (0, 1, 2)
    pub safesearch: Option<u8>,
    /// Language code
    pub language: Option<String>,
    /// Page number
    pub pageno: Option<u32>,
}

/// Error body returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<Attempt>,
}

/// Handler-level failure
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Search(SearchError),
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        Self::Search(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    detail,
                    attempts: vec![],
                },
            ),
            Self::Search(e) => {
                let status = if e.deadline_exceeded() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                (
                    status,
                    ErrorResponse {
                        detail: format!("Search service unavailable: {}", e),
                        attempts: e.attempts().to_vec(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Validate parameters and build the query for `category`
pub fn build_query(
    settings: &SearchSettings,
    params: SearchParams,
    category: Category,
) -> Result<SearchQuery, ApiError> {
    let text = params.q.unwrap_or_default();

    let safesearch = match params.safesearch {
        Some(code) => SafeSearch::from_code(code)
            .ok_or_else(|| ApiError::BadRequest("safesearch must be 0, 1 or 2".to_string()))?,
        None => settings.safe_search,
    };

    let default_limit = if category == Category::Images {
        settings.default_image_limit
    } else {
        settings.default_limit
    };
    let limit = params
        .limit
        .unwrap_or(default_limit)
        .clamp(1, settings.max_results.max(1));

    let language = params
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| settings.default_language.clone());

    let query = SearchQuery::new(text)
        .with_category(category)
        .with_language(language)
        .with_safesearch(safesearch)
        .with_limit(limit)
        .with_page(params.pageno.unwrap_or(1));
    if query.is_empty() {
        return Err(ApiError::BadRequest("q must be a non-empty string".to_string()));
    }
    Ok(query)
}

async fn run_search(
    state: &AppState,
    params: SearchParams,
    category: Category,
) -> Result<Json<ResultSet>, ApiError> {
    let query = build_query(&state.settings.search, params, category)?;
    let set = state.search.search(&query).await.map_err(|e| {
        warn!("Search for '{}' failed: {:?}", query.text, e.attempts());
        ApiError::from(e)
    })?;
    Ok(Json(set))
}

/// General web search; category selectable via `category`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResultSet>, ApiError> {
    let category = match params.category.as_deref() {
        Some(c) => c.parse().map_err(ApiError::BadRequest)?,
        None => Category::General,
    };
    run_search(&state, params, category).await
}

/// News search
pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResultSet>, ApiError> {
    run_search(&state, params, Category::News).await
}

/// Image search
pub async fn images(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResultSet>, ApiError> {
    run_search(&state, params, Category::Images).await
}

/// Video search
pub async fn videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ResultSet>, ApiError> {
    run_search(&state, params, Category::Videos).await
}

#[derive(Debug, Serialize)]
pub struct EndpointHealth {
    pub url: String,
    pub region: Option<String>,
    pub probe: ProbeStatus,
    pub state: HealthState,
    pub consecutive_failures: u32,
}

/// Result store reachability
#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub store: String,
    /// `healthy`, `unreachable` or `disabled`
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub endpoints: Vec<EndpointHealth>,
    pub cache: CacheHealth,
    pub timestamp: String,
}

async fn cache_health(state: &AppState) -> CacheHealth {
    match state.search.cache() {
        Some(cache) => CacheHealth {
            store: cache.store_name().to_string(),
            status: if cache.is_reachable().await {
                "healthy"
            } else {
                "unreachable"
            },
        },
        None => CacheHealth {
            store: "disabled".to_string(),
            status: "disabled",
        },
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let timeout = state.settings.backend.probe_timeout();
    let endpoints = state.search.coordinator().pool().all();

    let (probes, cache) = futures::join!(
        join_all(
            endpoints
                .iter()
                .map(|endpoint| state.client.probe(endpoint, timeout)),
        ),
        cache_health(&state),
    );

    let endpoints: Vec<EndpointHealth> = endpoints
        .iter()
        .zip(probes)
        .map(|(endpoint, probe)| EndpointHealth {
            url: endpoint.url().to_string(),
            region: endpoint.region().map(str::to_string),
            probe,
            state: endpoint.state(),
            consecutive_failures: endpoint.consecutive_failures(),
        })
        .collect();

    let status = if endpoints.iter().any(|e| e.probe == ProbeStatus::Healthy) {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        endpoints,
        cache,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Metrics snapshot
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.search.metrics().snapshot())
}

/// Service info
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.instance_name(),
        "version": crate::VERSION,
        "cache": state.cache_mode(),
        "categories": Category::ALL,
        "endpoints": [
            "/search - Web search",
            "/news - News search",
            "/images - Image search",
            "/videos - Video search",
            "/health - Health check",
            "/stats - Usage statistics"
        ]
    }))
}
