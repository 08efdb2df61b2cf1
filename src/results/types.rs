//! Result type definitions

use serde::{Deserialize, Serialize};

/// A single normalized search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result
    pub title: String,
    /// The URL of the result
    pub url: String,
    /// Content snippet/description
    pub content: Option<String>,
    /// Engine that returned this result
    pub engine: String,
    /// Relevance score reported by the backend
    pub score: Option<f64>,
    /// Published date, as reported by the backend
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    /// Thumbnail URL (image searches only)
    pub thumbnail: Option<String>,
}

impl SearchResult {
    /// Create a new result
    pub fn new(url: impl Into<String>, title: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: None,
            engine: engine.into(),
            score: None,
            published_date: None,
            thumbnail: None,
        }
    }

    /// Add content to the result
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add a score
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Ordered, normalized output of one successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// The query text that produced this set
    pub query: String,
    /// Results in backend order
    pub results: Vec<SearchResult>,
    /// Estimated total number of matches
    pub total: u64,
    /// Backend round-trip time in seconds
    #[serde(rename = "time")]
    pub elapsed: f64,
    /// Whether this set was served from the cache
    pub cached: bool,
    /// Contributing engines, in order of first appearance
    pub engines: Vec<String>,
}

impl ResultSet {
    /// Build a fresh (uncached) result set, keeping at most `limit` results
    pub fn new(
        query: impl Into<String>,
        mut results: Vec<SearchResult>,
        limit: usize,
        total: u64,
        elapsed: f64,
        extra_engines: &[String],
    ) -> Self {
        results.truncate(limit);

        let mut engines: Vec<String> = Vec::new();
        let names = results
            .iter()
            .map(|r| &r.engine)
            .chain(extra_engines.iter())
            .filter(|name| !name.is_empty());
        for name in names {
            if !engines.contains(name) {
                engines.push(name.clone());
            }
        }

        Self {
            query: query.into(),
            results,
            total,
            elapsed,
            cached: false,
            engines,
        }
    }

    /// Same set, flagged as served from the cache
    pub fn into_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
