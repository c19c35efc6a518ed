//! Request orchestration: auth, normalization, cache, upstream, reshaping

use super::models::SearchResponse;
use crate::auth::{ApiKeyGate, AuthDecision};
use crate::cache::{fingerprint, CacheLookup, CacheManager, CacheStore};
use crate::config::Settings;
use crate::error::GatewayError;
use crate::metrics::Metrics;
use crate::query::{EndpointKind, QueryNormalizer, RawQueryParams};
use crate::results::{self, ResultSet};
use crate::suggestions::{self, MAX_SUGGESTIONS};
use crate::upstream::UpstreamClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs one client request through the whole gateway pipeline
pub struct Search {
    gate: ApiKeyGate,
    normalizer: QueryNormalizer,
    cache: CacheManager,
    upstream: UpstreamClient,
    deadline: Duration,
    metrics: Arc<Metrics>,
}

impl Search {
    /// Create a new search executor
    pub fn new(
        settings: &Settings,
        store: Arc<dyn CacheStore>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            gate: ApiKeyGate::new(&settings.auth.api_keys),
            normalizer: QueryNormalizer::new(&settings.upstream.engines),
            cache: CacheManager::with_settings(store, &settings.cache),
            upstream: UpstreamClient::with_settings(&settings.upstream)?,
            deadline: settings.upstream.deadline()?,
            metrics,
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Reject the request unless the key is allowed
    pub fn authorize(&self, api_key: Option<&str>) -> Result<(), GatewayError> {
        match self.gate.authorize(api_key) {
            AuthDecision::Allowed => Ok(()),
            AuthDecision::Denied => {
                self.metrics.record_auth_denied();
                Err(GatewayError::Unauthorized)
            }
        }
    }

    /// Execute a search request for one endpoint
    pub async fn execute(
        &self,
        kind: EndpointKind,
        params: &RawQueryParams,
        api_key: Option<&str>,
    ) -> Result<SearchResponse, GatewayError> {
        let span = info_span!("search", request_id = %Uuid::new_v4(), kind = %kind);
        self.run(kind, params, api_key).instrument(span).await
    }

    async fn run(
        &self,
        kind: EndpointKind,
        params: &RawQueryParams,
        api_key: Option<&str>,
    ) -> Result<SearchResponse, GatewayError> {
        self.authorize(api_key)?;

        let query = self.normalizer.normalize(params, kind).map_err(|e| {
            self.metrics.record_validation_failed();
            debug!("Rejected query: {}", e);
            e
        })?;
        self.metrics.inc_search();

        let key = fingerprint(&query);
        if let CacheLookup::Hit(result_set) = self.cache.get(&key).await {
            self.metrics.record_cache(true);
            info!("Serving '{}' from cache", query.text);
            return Ok(SearchResponse::cached(result_set));
        }
        self.metrics.record_cache(false);

        let fetch = self.upstream.fetch(&query, self.deadline).await.map_err(|e| {
            self.metrics.record_upstream_unavailable();
            warn!("Upstream unavailable: {}", e);
            e
        })?;
        if fetch.timed_out {
            self.metrics.record_upstream_timeout();
        }
        self.metrics.record_engine_failures(&fetch.failed);

        let results = results::normalize(fetch.hits);
        let derived = suggestions::suggest(&query.text, &results);
        let suggestions =
            suggestions::merge(&query.text, &fetch.suggestions, &derived, MAX_SUGGESTIONS);

        let result_set = ResultSet::new(query.text.clone(), results)
            .with_engines_used(fetch.responded)
            .with_suggestions(suggestions);

        // A timed-out fetch is an empty answer, not a cacheable one.
        if !fetch.timed_out {
            self.cache
                .put(&key, &result_set, self.cache.default_ttl())
                .await;
        }

        info!(
            "Query '{}' produced {} results from {:?}",
            query.text, result_set.total, result_set.engines_used
        );
        Ok(SearchResponse::fresh(result_set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BrokenStore, MemoryStore};
    use crate::error::{UpstreamError, ValidationError};
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.upstream.base_url = server.uri();
        settings.upstream.timeout = 2.0;
        settings
    }

    fn search_with(settings: &Settings, store: Arc<dyn CacheStore>) -> Search {
        Search::new(settings, store, Arc::new(Metrics::new())).unwrap()
    }

    fn scenario_body() -> serde_json::Value {
        json!({
            "results": [
                {"url": "https://tokio.rs/", "title": "Tokio", "content": "Tokio runtime for async Rust", "engine": "google", "score": 0.9},
                {"url": "https://rust-lang.github.io/async-book", "title": "Async book", "content": "The async book and tokio", "engine": "google", "score": 0.5},
                {"url": "https://tokio.rs", "title": "Tokio - async", "content": "runtime", "engine": "duckduckgo", "score": 0.7}
            ],
            "suggestions": []
        })
    }

    #[tokio::test]
    async fn test_scenario_dedup_and_cache() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .and(query_param("q", "rust async"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scenario_body()))
            .expect(1)
            .mount(&server)
            .await;

        let search = search_with(&settings_for(&server), Arc::new(MemoryStore::new(100)));
        let params = RawQueryParams::new("rust async");

        let first = search
            .execute(EndpointKind::Search, &params, None)
            .await
            .unwrap();
        assert!(!first.cached);
        let set = &first.result_set;
        assert_eq!(set.total, 2);
        assert_eq!(set.results.len(), 2);
        assert_eq!(set.results[0].url, "https://tokio.rs");
        assert_eq!(set.results[0].score, Some(0.9));
        assert_eq!(set.results[0].engine, "google");
        assert_eq!(
            set.engines_used.iter().collect::<Vec<_>>(),
            vec!["duckduckgo", "google"]
        );
        assert_eq!(set.suggestions, vec!["rust async tokio", "rust async book"]);

        let second = search
            .execute(EndpointKind::Search, &params, None)
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.result_set, first.result_set);

        let snap = search.metrics().snapshot();
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"url": "https://a.com", "title": "A", "engine": "google"},
                    {"url": "https://b.com", "title": "B", "engine": "duckduckgo"},
                    {"url": "https://a.com/?utm_source=ddg", "title": "A", "engine": "duckduckgo"}
                ]
            })))
            .mount(&server)
            .await;

        let search = search_with(&settings_for(&server), Arc::new(MemoryStore::new(100)));
        let params = RawQueryParams::new("x").with_engines("google,bing,duckduckgo");
        let response = search
            .execute(EndpointKind::Search, &params, None)
            .await
            .unwrap();

        assert_eq!(
            response.result_set.engines_used.iter().collect::<Vec<_>>(),
            vec!["duckduckgo", "google"]
        );
        assert_eq!(response.result_set.total, 2);
        assert_eq!(
            search.metrics().snapshot().engine_failures.get("bing"),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_cache_outage_recomputes() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scenario_body()))
            .expect(2)
            .mount(&server)
            .await;

        let search = search_with(&settings_for(&server), Arc::new(BrokenStore));
        let params = RawQueryParams::new("rust async");

        for _ in 0..2 {
            let response = search
                .execute(EndpointKind::Search, &params, None)
                .await
                .unwrap();
            assert!(!response.cached);
            assert_eq!(response.result_set.total, 2);
        }
    }

    #[tokio::test]
    async fn test_denied_before_any_work() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scenario_body()))
            .expect(0)
            .mount(&server)
            .await;

        let mut settings = settings_for(&server);
        settings.auth.api_keys = vec!["abc".to_string()];
        let search = search_with(&settings, Arc::new(MemoryStore::new(100)));
        let params = RawQueryParams::new("rust");

        for key in [None, Some("wrong")] {
            let err = search
                .execute(EndpointKind::Search, &params, key)
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Unauthorized));
        }

        let snap = search.metrics().snapshot();
        assert_eq!(snap.auth_denied, 2);
        assert_eq!(snap.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(scenario_body()))
            .expect(0)
            .mount(&server)
            .await;

        let search = search_with(&settings_for(&server), Arc::new(MemoryStore::new(100)));

        let err = search
            .execute(EndpointKind::Search, &RawQueryParams::new("  "), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::MissingQuery)
        ));

        let err = search
            .execute(
                EndpointKind::News,
                &RawQueryParams::new("x").with_page("42"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::InvalidPage(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(scenario_body())
                    .set_delay(Duration::from_secs(1)),
            )
            .mount(&server)
            .await;

        let mut settings = settings_for(&server);
        settings.upstream.timeout = 0.1;
        let search = search_with(&settings, Arc::new(MemoryStore::new(100)));
        let params = RawQueryParams::new("slow").with_engines("google");

        for _ in 0..2 {
            let response = search
                .execute(EndpointKind::Search, &params, None)
                .await
                .unwrap();
            assert!(!response.cached);
            assert_eq!(response.result_set.total, 0);
            assert!(response.result_set.engines_used.is_empty());
        }
        let snap = search.metrics().snapshot();
        assert_eq!(snap.upstream_timeouts, 2);
        assert_eq!(snap.cache_misses, 2);
        assert_eq!(snap.engine_failures.get("google"), Some(&2));
    }

    #[test]
    fn test_unrepresentable_timeout_is_an_error() {
        let mut settings = Settings::default();
        settings.upstream.timeout = 1e20;
        let result = Search::new(
            &settings,
            Arc::new(MemoryStore::new(10)),
            Arc::new(Metrics::new()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upstream_down_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let search = search_with(&settings_for(&server), Arc::new(MemoryStore::new(100)));
        let err = search
            .execute(EndpointKind::Search, &RawQueryParams::new("x"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::UpstreamUnavailable(UpstreamError::Status(503))
        ));
        assert_eq!(search.metrics().snapshot().upstream_unavailable, 1);
    }
}
