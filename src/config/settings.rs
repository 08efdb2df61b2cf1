//! Settings structures for SearXNG-Gateway configuration

use crate::query::SafeSearch;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Upper bound for any configured timeout, in seconds
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;
/// Upper bound for cache TTL and endpoint cool-down, in seconds
pub const MAX_RETENTION_SECS: u64 = 365 * 24 * 3600;

/// Main settings structure, loaded from `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub cache: CacheSettings,
    pub search: SearchSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("GATEWAY_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("GATEWAY_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("GATEWAY_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("SEARXNG_URL") {
            let endpoints: Vec<EndpointConfig> = val
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(EndpointConfig::new)
                .collect();
            if !endpoints.is_empty() {
                self.backend.endpoints = endpoints;
            }
        }
        if let Some(val) = var("CACHE_TTL") {
            if let Ok(ttl) = val.parse() {
                self.cache.ttl = ttl;
            }
        }
        if let Some(val) = var("REDIS_URL") {
            let val = val.trim();
            if !val.is_empty() {
                self.cache.redis_url = Some(val.to_string());
            }
        }
        if let Some(val) = var("MAX_RESULTS") {
            if let Ok(max) = val.parse() {
                self.search.max_results = max;
            }
        }
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.backend.endpoints.is_empty() {
            bail!("backend.endpoints must list at least one SearXNG instance");
        }
        for endpoint in &self.backend.endpoints {
            let url = Url::parse(&endpoint.url)
                .with_context(|| format!("invalid endpoint URL: {}", endpoint.url))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("endpoint URL must be http or https: {}", endpoint.url);
            }
        }
        check_timeout("backend.attempt_timeout", self.backend.attempt_timeout)?;
        check_timeout("backend.request_deadline", self.backend.request_deadline)?;
        check_timeout("backend.probe_timeout", self.backend.probe_timeout)?;
        if self.backend.cooldown > MAX_RETENTION_SECS {
            bail!("backend.cooldown must be at most {} seconds", MAX_RETENTION_SECS);
        }
        if self.cache.ttl == 0 || self.cache.ttl > MAX_RETENTION_SECS {
            bail!("cache.ttl must be between 1 and {} seconds", MAX_RETENTION_SECS);
        }
        if let Some(url) = &self.cache.redis_url {
            redis::Client::open(url.as_str())
                .with_context(|| format!("invalid cache.redis_url: {}", url))?;
            check_timeout("cache.redis_timeout", self.cache.redis_timeout)?;
        }
        if self.search.max_results == 0 {
            bail!("search.max_results must be at least 1");
        }
        Ok(())
    }
}

fn check_timeout(name: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs <= 0.0 || secs > MAX_TIMEOUT_SECS {
        bail!("{} must be a number of seconds in (0, {}]", name, MAX_TIMEOUT_SECS);
    }
    Ok(())
}

/// Seconds to a duration; unrepresentable values fall back to `default`
fn seconds(secs: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| Duration::from_secs_f64(default))
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the info route
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "SearXNG Gateway".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Outgoing requests and failover policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Candidate SearXNG instances, in preference order
    pub endpoints: Vec<EndpointConfig>,
    /// Timeout for a single attempt, in seconds
    pub attempt_timeout: f64,
    /// Overall budget for all attempts of one request, in seconds
    pub request_deadline: f64,
    /// Consecutive failures before an endpoint is marked unhealthy
    pub unhealthy_threshold: u32,
    /// How long an unhealthy endpoint is tried last, in seconds
    pub cooldown: u64,
    /// Timeout for `/healthz` probes, in seconds
    pub probe_timeout: f64,
    /// Idle connections kept per host
    pub pool_maxsize: usize,
    /// Verify TLS certificates
    pub verify_ssl: bool,
}

impl BackendSettings {
    pub fn attempt_timeout(&self) -> Duration {
        seconds(self.attempt_timeout, 5.0)
    }

    pub fn request_deadline(&self) -> Duration {
        seconds(self.request_deadline, 15.0)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown.min(MAX_RETENTION_SECS))
    }

    pub fn probe_timeout(&self) -> Duration {
        seconds(self.probe_timeout, 5.0)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoints: vec![EndpointConfig::new("http://localhost:8080")],
            attempt_timeout: 5.0,
            request_deadline: 15.0,
            unhealthy_threshold: 3,
            cooldown: 60,
            probe_timeout: 5.0,
            pool_maxsize: 20,
            verify_ssl: true,
        }
    }
}

/// One configured SearXNG instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the instance
    pub url: String,
    /// Optional region label
    #[serde(default)]
    pub region: Option<String>,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            region: None,
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Enable the result cache
    pub enabled: bool,
    /// Entry lifetime in seconds
    pub ttl: u64,
    /// Maximum number of cached result sets
    pub max_capacity: u64,
    /// Shared Redis store; the in-process store is used when unset
    pub redis_url: Option<String>,
    /// Timeout for a single Redis command, in seconds
    pub redis_timeout: f64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl.min(MAX_RETENTION_SECS))
    }

    pub fn redis_timeout(&self) -> Duration {
        seconds(self.redis_timeout, 1.0)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 3600,
            max_capacity: 10_000,
            redis_url: None,
            redis_timeout: 1.0,
        }
    }
}

/// Inbound search defaults and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Results returned when `limit` is omitted
    pub default_limit: u32,
    /// Results returned by image searches when `limit` is omitted
    pub default_image_limit: u32,
    /// Upper bound for `limit`
    pub max_results: u32,
    /// Language used when `language` is omitted
    pub default_language: String,
    /// Safe search level used when `safesearch` is omitted
    pub safe_search: SafeSearch,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_image_limit: 20,
            max_results: 100,
            default_language: "en".to_string(),
            safe_search: SafeSearch::Moderate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.cache.ttl, 3600);
        assert_eq!(settings.search.max_results, 100);
        assert_eq!(settings.backend.endpoints.len(), 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
backend:
  endpoints:
    - url: http://searx-a:8080
      region: eu
    - url: https://searx-b.example.org
  attempt_timeout: 2.5
cache:
  ttl: 600
search:
  safe_search: strict
"#;
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.backend.endpoints.len(), 2);
        assert_eq!(settings.backend.endpoints[0].region.as_deref(), Some("eu"));
        assert_eq!(settings.backend.attempt_timeout(), Duration::from_millis(2500));
        assert_eq!(settings.backend.request_deadline, 15.0);
        assert_eq!(settings.cache.ttl(), Duration::from_secs(600));
        assert_eq!(settings.search.safe_search, SafeSearch::Strict);
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("SEARXNG_URL", "http://a:8080, http://b:8080,"),
            ("CACHE_TTL", "120"),
            ("MAX_RESULTS", "not-a-number"),
            ("GATEWAY_PORT", "9000"),
            ("REDIS_URL", "redis://cache:6379/0"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.merge_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(
            settings.backend.endpoints,
            vec![
                EndpointConfig::new("http://a:8080"),
                EndpointConfig::new("http://b:8080")
            ]
        );
        assert_eq!(settings.cache.ttl, 120);
        assert_eq!(settings.search.max_results, 100);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.cache.redis_url.as_deref(), Some("redis://cache:6379/0"));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut settings = Settings::default();
        settings.backend.endpoints.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.endpoints = vec![EndpointConfig::new("not a url")];
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.attempt_timeout = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.attempt_timeout = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.request_deadline = f64::INFINITY;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.probe_timeout = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.backend.cooldown = u64::MAX;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.merge_vars(|name| (name == "CACHE_TTL").then(|| u64::MAX.to_string()));
        assert_eq!(settings.cache.ttl, u64::MAX);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.cache.redis_url = Some("not a url".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_duration_accessors_never_panic() {
        let mut backend = BackendSettings::default();
        backend.attempt_timeout = f64::NAN;
        backend.probe_timeout = -1.0;
        backend.request_deadline = f64::MAX;

        assert_eq!(backend.attempt_timeout(), Duration::from_secs(5));
        assert_eq!(backend.probe_timeout(), Duration::from_secs(5));
        assert_eq!(backend.request_deadline(), Duration::from_secs(15));

        let cache = CacheSettings {
            ttl: u64::MAX,
            ..CacheSettings::default()
        };
        assert_eq!(cache.ttl(), Duration::from_secs(MAX_RETENTION_SECS));
    }
}
