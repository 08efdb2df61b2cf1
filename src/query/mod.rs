//! Search query model
//!
//! A [`Query`] is the immutable description of one search: the text, the
//! category, language, safe-search level, result limit and page. The same
//! value is sent to the backend and, once canonicalized, keys the cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every cache key
pub const CACHE_KEY_PREFIX: &str = "search:";

/// Search category understood by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    News,
    Images,
    Videos,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::News,
        Category::Images,
        Category::Videos,
    ];

    /// Name used in the backend's `categories` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::News => "news",
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "news" => Ok(Self::News),
            "images" => Ok(Self::Images),
            "videos" => Ok(Self::Videos),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Safe search level: 0 = off, 1 = moderate, 2 = strict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    /// Numeric code sent to the backend
    pub fn code(&self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Moderate => 1,
            Self::Strict => 2,
        }
    }

    /// Parse a numeric code, rejecting anything outside 0..=2
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Moderate),
            2 => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Complete search query with all parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// The search text
    pub text: String,
    /// Backend category
    pub category: Category,
    /// Language code (`all` means no preference)
    pub language: String,
    /// Safe search level
    pub safesearch: SafeSearch,
    /// Maximum number of results
    pub limit: u32,
    /// Page number (1-indexed)
    pub pageno: u32,
}

impl Query {
    /// Create a query with default parameters
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: Category::General,
            language: "all".to_string(),
            safesearch: SafeSearch::Moderate,
            limit: 10,
            pageno: 1,
        }
    }

    /// Set category
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set safe search
    pub fn with_safesearch(mut self, level: SafeSearch) -> Self {
        self.safesearch = level;
        self
    }

    /// Set result limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.pageno = page;
        self
    }

    /// Check if query text is empty
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Normalize the representation so that equivalent queries compare equal.
    ///
    /// Idempotent: canonicalizing a canonical query returns it unchanged.
    pub fn canonicalize(&self) -> Query {
        let text = self.text.split_whitespace().collect::<Vec<_>>().join(" ");

        let language = self.language.trim().to_ascii_lowercase().replace('_', "-");
        let language = if language.is_empty() {
            "all".to_string()
        } else {
            language
        };

        Query {
            text,
            category: self.category,
            language,
            safesearch: self.safesearch,
            limit: self.limit.max(1),
            pageno: self.pageno.max(1),
        }
    }

    /// Stable cache key for the canonical form of this query
    pub fn cache_key(&self) -> String {
        let canonical = self.canonicalize();
        // Struct fields serialize in declaration order, so the encoding is stable.
        let encoded = serde_json::to_string(&canonical).unwrap_or_else(|_| {
            format!(
                "{}\n{}\n{}\n{}\n{}\n{}",
                canonical.text,
                canonical.category,
                canonical.language,
                canonical.safesearch.code(),
                canonical.limit,
                canonical.pageno
            )
        });

        format!("{}{:x}", CACHE_KEY_PREFIX, md5::compute(encoded.as_bytes()))
    }
}
