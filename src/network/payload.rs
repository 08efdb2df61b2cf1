//! Strict schema for the SearXNG JSON response

use crate::query::{Category, Query};
use crate::results::{ResultSet, SearchResult};
use serde::Deserialize;

/// Top-level `format=json` response
#[derive(Debug, Deserialize)]
pub struct BackendPayload {
    /// Estimated number of matches
    #[serde(default)]
    pub number_of_results: Option<f64>,
    /// Backend-side search time in seconds, when reported
    #[serde(default)]
    pub search_duration: Option<f64>,
    /// Result records; required
    pub results: Vec<BackendRecord>,
}

/// One entry of `results`
#[derive(Debug, Deserialize)]
pub struct BackendRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub engines: Option<Vec<String>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub img_src: Option<String>,
}

impl BackendRecord {
    /// Convert to a normalized result; `None` when URL or title is missing
    fn into_result(self, category: Category) -> Option<SearchResult> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        let engine = self
            .engine
            .or_else(|| self.engines.as_ref().and_then(|e| e.first().cloned()))
            .unwrap_or_else(|| "unknown".to_string());

        let thumbnail = if category == Category::Images {
            self.thumbnail.or(self.img_src)
        } else {
            None
        };

        Some(SearchResult {
            title,
            url,
            content: self.content.or(self.abstract_text),
            engine,
            score: self.score,
            published_date: self.published_date,
            thumbnail,
        })
    }
}

impl BackendPayload {
    /// Parse a response body; any schema violation is an error
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Normalize into a result set for `query`.
    ///
    /// `elapsed` is the measured round trip, used when the backend does not
    /// report its own `search_duration`.
    pub fn into_result_set(self, query: &Query, elapsed: f64) -> ResultSet {
        let elapsed = self
            .search_duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(elapsed);

        let total = self
            .number_of_results
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n as u64)
            .unwrap_or(0);

        let mut extra_engines = Vec::new();
        let mut results = Vec::with_capacity(self.results.len());
        for record in self.results {
            if let Some(engines) = &record.engines {
                extra_engines.extend(engines.iter().cloned());
            }
            if let Some(result) = record.into_result(query.category) {
                results.push(result);
            }
        }

        ResultSet::new(
            query.text.clone(),
            results,
            query.limit as usize,
            total,
            elapsed,
            &extra_engines,
        )
    }
}
