//! Failover across backend endpoints

use crate::config::BackendSettings;
use crate::endpoints::{now_ms, EndpointPool};
use crate::error::{Attempt, FailureKind, SearchError};
use crate::metrics::Metrics;
use crate::network::SearchBackend;
use crate::query::Query;
use crate::results::ResultSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

/// Timeouts and health thresholds for one coordinator
#[derive(Debug, Clone)]
pub struct FailoverPolicy {
    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
    /// Upper bound for all attempts of one search
    pub request_deadline: Duration,
    /// Consecutive failures before an endpoint becomes unhealthy
    pub unhealthy_threshold: u32,
    /// How long an unhealthy endpoint is tried last
    pub cooldown: Duration,
}

impl FailoverPolicy {
    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self {
            attempt_timeout: settings.attempt_timeout(),
            request_deadline: settings.request_deadline(),
            unhealthy_threshold: settings.unhealthy_threshold,
            cooldown: settings.cooldown(),
        }
    }
}

impl Default for FailoverPolicy {
    fn default() -> Self {
        Self::from_settings(&BackendSettings::default())
    }
}

/// Tries endpoints one after another until one answers
pub struct Coordinator {
    pool: EndpointPool,
    backend: Arc<dyn SearchBackend>,
    policy: FailoverPolicy,
    metrics: Arc<Metrics>,
}

impl Coordinator {
    /// Create a coordinator with the default policy
    pub fn new(
        pool: EndpointPool,
        backend: Arc<dyn SearchBackend>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            backend,
            policy: FailoverPolicy::default(),
            metrics,
        }
    }

    /// Set the failover policy
    pub fn with_policy(mut self, policy: FailoverPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn policy(&self) -> &FailoverPolicy {
        &self.policy
    }

    /// Run `query` against the candidates in order; first success wins.
    ///
    /// On total failure the error lists exactly one attempt per candidate,
    /// in attempt order. Candidates never reached because the request
    /// deadline ran out are listed as [`FailureKind::DeadlineExceeded`].
    pub async fn search(&self, query: &Query) -> Result<ResultSet, SearchError> {
        let candidates = self.pool.candidates(self.policy.cooldown, now_ms());
        let deadline = Instant::now() + self.policy.request_deadline;
        let mut attempts = Vec::with_capacity(candidates.len());

        info!(
            "Searching '{}' across {} endpoints",
            query.text,
            candidates.len()
        );

        let mut remaining_candidates = candidates.iter();
        while let Some(endpoint) = remaining_candidates.next() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                attempts.push(Attempt::new(endpoint.url(), FailureKind::DeadlineExceeded));
                break;
            }

            let budget = self.policy.attempt_timeout.min(remaining);
            let cut_by_deadline = budget < self.policy.attempt_timeout;
            debug!("Attempting {} with budget {:?}", endpoint.url(), budget);

            let start = Instant::now();
            let outcome = match timeout(budget, self.backend.fetch(endpoint, query, budget)).await
            {
                Ok(Err(FailureKind::Timeout)) | Err(_) if cut_by_deadline => {
                    Err(FailureKind::DeadlineExceeded)
                }
                Ok(result) => result,
                Err(_) => Err(FailureKind::Timeout),
            };

            match outcome {
                Ok(set) => {
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    endpoint.mark_success();
                    self.metrics.record_success(endpoint.url(), elapsed_ms);
                    info!(
                        "{} answered with {} results in {}ms",
                        endpoint.url(),
                        set.len(),
                        elapsed_ms
                    );
                    return Ok(set);
                }
                Err(kind) => {
                    let state =
                        endpoint.mark_failure(self.policy.unhealthy_threshold, now_ms());
                    self.metrics.record_failure(endpoint.url());
                    warn!(
                        "Attempt on {} failed: {} (now {:?})",
                        endpoint.url(),
                        kind,
                        state
                    );

                    let out_of_time = kind == FailureKind::DeadlineExceeded;
                    attempts.push(Attempt::new(endpoint.url(), kind));
                    if out_of_time {
                        break;
                    }
                }
            }
        }

        for endpoint in remaining_candidates {
            attempts.push(Attempt::new(endpoint.url(), FailureKind::DeadlineExceeded));
        }

        Err(SearchError::AllEndpointsFailed { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{Endpoint, HealthState};
    use crate::network::BackendClient;
    use crate::results::SearchResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Clone)]
    enum Behavior {
        Answer(usize),
        Fail(FailureKind),
        Slow(Duration),
    }

    /// Backend whose answer per endpoint is fixed up front
    struct ScriptedBackend {
        script: HashMap<String, Behavior>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(script: &[(&str, Behavior)]) -> Arc<Self> {
            Arc::new(Self {
                script: script
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn results(count: usize) -> Vec<SearchResult> {
        (0..count)
            .map(|n| SearchResult::new(format!("https://r.example/{}", n), "r", "google"))
            .collect()
    }

    #[async_trait]
    impl SearchBackend for ScriptedBackend {
        async fn fetch(
            &self,
            endpoint: &Endpoint,
            query: &Query,
            _timeout: Duration,
        ) -> Result<ResultSet, FailureKind> {
            self.calls.lock().unwrap().push(endpoint.url().to_string());
            let limit = query.limit as usize;
            match self.script.get(endpoint.url()).cloned() {
                Some(Behavior::Answer(n)) => {
                    Ok(ResultSet::new(&query.text, results(n), limit, n as u64, 0.1, &[]))
                }
                Some(Behavior::Fail(kind)) => Err(kind),
                Some(Behavior::Slow(delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(ResultSet::new(&query.text, results(1), limit, 1, 0.1, &[]))
                }
                None => Err(FailureKind::Network),
            }
        }
    }

    fn coordinator(urls: &[&str], backend: Arc<ScriptedBackend>) -> Coordinator {
        let pool = EndpointPool::new(urls.iter().map(|u| Endpoint::new(*u, None)).collect());
        Coordinator::new(pool, backend, Arc::new(Metrics::new()))
    }

    fn kinds(error: &SearchError) -> Vec<(String, FailureKind)> {
        error
            .attempts()
            .iter()
            .map(|a| (a.endpoint.clone(), a.kind.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_first_success_makes_one_call() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Answer(3)),
            ("http://b", Behavior::Answer(3)),
        ]);
        let coordinator = coordinator(&["http://a", "http://b"], backend.clone());

        let set = coordinator.search(&Query::new("rust")).await.unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(backend.calls(), vec!["http://a"]);
        assert_eq!(coordinator.pool().all()[0].state(), HealthState::Healthy);
        assert_eq!(coordinator.pool().all()[1].state(), HealthState::Unknown);
    }

    #[tokio::test]
    async fn test_falls_back_in_configured_order() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Fail(FailureKind::Timeout)),
            ("http://b", Behavior::Fail(FailureKind::BackendError { status: 502 })),
            ("http://c", Behavior::Answer(2)),
            ("http://d", Behavior::Answer(2)),
        ]);
        let coordinator = coordinator(
            &["http://a", "http://b", "http://c", "http://d"],
            backend.clone(),
        );

        let set = coordinator.search(&Query::new("rust")).await.unwrap();

        assert!(!set.cached);
        assert_eq!(backend.calls(), vec!["http://a", "http://b", "http://c"]);
        assert_eq!(coordinator.pool().all()[0].state(), HealthState::Degraded);
        assert_eq!(coordinator.pool().all()[2].state(), HealthState::Healthy);
    }

    #[tokio::test]
    async fn test_all_failed_lists_every_candidate_in_order() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Fail(FailureKind::Timeout)),
            ("http://b", Behavior::Fail(FailureKind::MalformedResponse)),
            ("http://c", Behavior::Fail(FailureKind::BackendError { status: 500 })),
        ]);
        let coordinator = coordinator(&["http://a", "http://b", "http://c"], backend);

        let error = coordinator.search(&Query::new("rust")).await.unwrap_err();

        assert_eq!(
            kinds(&error),
            vec![
                ("http://a".to_string(), FailureKind::Timeout),
                ("http://b".to_string(), FailureKind::MalformedResponse),
                ("http://c".to_string(), FailureKind::BackendError { status: 500 }),
            ]
        );
        assert!(!error.deadline_exceeded());
    }

    #[tokio::test]
    async fn test_unhealthy_endpoint_is_tried_last() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Fail(FailureKind::Network)),
            ("http://b", Behavior::Answer(1)),
        ]);
        let policy = FailoverPolicy {
            unhealthy_threshold: 2,
            ..FailoverPolicy::default()
        };
        let coordinator =
            coordinator(&["http://a", "http://b"], backend.clone()).with_policy(policy);

        coordinator.search(&Query::new("one")).await.unwrap();
        coordinator.search(&Query::new("two")).await.unwrap();
        assert_eq!(coordinator.pool().all()[0].state(), HealthState::Unhealthy);

        coordinator.search(&Query::new("three")).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec!["http://a", "http://b", "http://a", "http://b", "http://b"]
        );
    }

    #[tokio::test]
    async fn test_unhealthy_endpoint_still_tried_when_others_fail() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Fail(FailureKind::Network)),
            ("http://b", Behavior::Fail(FailureKind::Timeout)),
        ]);
        let policy = FailoverPolicy {
            unhealthy_threshold: 1,
            ..FailoverPolicy::default()
        };
        let coordinator =
            coordinator(&["http://a", "http://b"], backend.clone()).with_policy(policy);

        coordinator.search(&Query::new("one")).await.unwrap_err();
        let error = coordinator.search(&Query::new("two")).await.unwrap_err();

        // Both unhealthy and cooling down: configuration order is the tiebreak.
        assert_eq!(error.attempts().len(), 2);
        assert_eq!(error.attempts()[0].endpoint, "http://a");
    }

    #[tokio::test]
    async fn test_deadline_marks_unattempted_endpoints() {
        let backend = ScriptedBackend::new(&[
            ("http://a", Behavior::Slow(Duration::from_millis(250))),
            ("http://b", Behavior::Slow(Duration::from_millis(250))),
            ("http://c", Behavior::Answer(1)),
        ]);
        let policy = FailoverPolicy {
            attempt_timeout: Duration::from_millis(200),
            request_deadline: Duration::from_millis(300),
            ..FailoverPolicy::default()
        };
        let coordinator =
            coordinator(&["http://a", "http://b", "http://c"], backend.clone()).with_policy(policy);

        let error = coordinator.search(&Query::new("rust")).await.unwrap_err();

        assert_eq!(
            kinds(&error),
            vec![
                ("http://a".to_string(), FailureKind::Timeout),
                ("http://b".to_string(), FailureKind::DeadlineExceeded),
                ("http://c".to_string(), FailureKind::DeadlineExceeded),
            ]
        );
        assert!(error.deadline_exceeded());
        assert_eq!(backend.calls(), vec!["http://a", "http://b"]);
    }

    #[tokio::test]
    async fn test_empty_pool_fails_without_attempts() {
        let backend = ScriptedBackend::new(&[]);
        let coordinator = coordinator(&[], backend);

        let error = coordinator.search(&Query::new("rust")).await.unwrap_err();
        assert!(error.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_down_endpoint_then_live_endpoint_over_http() {
        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&down)
            .await;

        let up = MockServer::start().await;
        let records: Vec<_> = (0..30)
            .map(|n| {
                json!({
                    "title": format!("t{}", n),
                    "url": format!("https://u.example/{}", n),
                    "engine": "bing"
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"number_of_results": 30, "results": records})),
            )
            .expect(1)
            .mount(&up)
            .await;

        let pool = EndpointPool::new(vec![
            Endpoint::new(down.uri(), None),
            Endpoint::new(up.uri(), None),
        ]);
        let metrics = Arc::new(Metrics::new());
        let client = Arc::new(BackendClient::new().unwrap());
        let coordinator = Coordinator::new(pool, client, metrics.clone());

        let query = Query::new("python tutorial").with_limit(10);
        let set = coordinator.search(&query).await.unwrap();

        assert!(set.len() <= 10);
        assert!(!set.cached);
        assert_eq!(coordinator.pool().all()[0].state(), HealthState::Degraded);
        let snapshot = metrics.snapshot();
        let down_stats = snapshot
            .endpoints
            .iter()
            .find(|stats| stats.endpoint == down.uri())
            .unwrap();
        assert_eq!(down_stats.reliability, 0.0);
    }
}
