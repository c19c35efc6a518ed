//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        // Search variants
        .route("/search", get(handlers::search))
        .route("/news", get(handlers::news))
        .route("/tech", get(handlers::tech))
        .route("/images", get(handlers::images))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BrokenStore;
    use crate::config::Settings;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn router_for(server: &MockServer, keys: &[&str]) -> Router {
        let mut settings = Settings::default();
        settings.upstream.base_url = server.uri();
        settings.upstream.timeout = 2.0;
        settings.auth.api_keys = keys.iter().map(|k| k.to_string()).collect();
        create_router(AppState::new(settings).unwrap())
    }

    async fn get_json(router: Router, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(key) = key {
            request = request.header("X-API-Key", key);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let server = MockServer::start().await;
        let router = router_for(&server, &["secret"]);

        let (status, body) = get_json(router.clone(), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());

        let (status, body) = get_json(router, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_news_search() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .and(query_param("categories", "news"))
            .and(query_param("time_range", "day"))
            .and(query_param("q", "rust release"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"url": "https://blog.rust-lang.org/", "title": "Rust 1.80", "content": "Release notes", "engine": "bing news", "publishedDate": "2024-07-25T00:00:00"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let router = router_for(&server, &["secret"]);
        let (status, body) = get_json(router, "/news?q=rust+release", Some("secret")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["cached"], false);
        assert_eq!(body["results"][0]["url"], "https://blog.rust-lang.org");
        assert_eq!(body["results"][0]["published"], "2024-07-25T00:00:00Z");
    }

    #[tokio::test]
    async fn test_auth_required() {
        let server = MockServer::start().await;
        let router = router_for(&server, &["secret"]);

        let (status, body) = get_json(router.clone(), "/search?q=rust", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = get_json(router, "/stats", Some("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let server = MockServer::start().await;
        let router = router_for(&server, &[]);

        let (status, body) = get_json(router.clone(), "/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, body) = get_json(router, "/tech?q=x&freshness=decade", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("decade"));
    }

    #[tokio::test]
    async fn test_upstream_failure_statuses() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let router = router_for(&server, &[]);
        let (status, body) = get_json(router, "/images?q=cats", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn test_stats_counts_cache_traffic() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let router = router_for(&server, &[]);
        for _ in 0..2 {
            let (status, _) = get_json(router.clone(), "/search?q=rust", None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = get_json(router, "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cache_hits"], 1);
        assert_eq!(body["cache_misses"], 1);
        assert_eq!(body["searches"], 2);
    }

    #[tokio::test]
    async fn test_serves_through_cache_outage() {
        let server = MockServer::start().await;
        Mock::given(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"url": "https://a.com", "title": "A", "engine": "google"}]
            })))
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.upstream.base_url = server.uri();
        let state = AppState::with_store(settings, Arc::new(BrokenStore)).unwrap();

        let (status, body) = get_json(create_router(state), "/search?q=a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["cached"], false);
    }
}
