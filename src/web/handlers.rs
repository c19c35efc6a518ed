//! HTTP request handlers

use super::state::AppState;
use crate::auth::API_KEY_HEADER;
use crate::error::{GatewayError, UpstreamError};
use crate::metrics::MetricsSnapshot;
use crate::query::{EndpointKind, RawQueryParams};
use crate::search::SearchResponse;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UpstreamUnavailable(UpstreamError::Status(_)) => StatusCode::BAD_GATEWAY,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    pub cache_hit_rate: f64,
    pub cache_ttl_secs: u64,
    pub upstream: String,
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

async fn run(
    state: &AppState,
    kind: EndpointKind,
    headers: &HeaderMap,
    params: &RawQueryParams,
) -> Result<Json<SearchResponse>, GatewayError> {
    state
        .search
        .execute(kind, params, api_key(headers))
        .await
        .map(Json)
}

/// Service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "ClawSearch API gateway",
        "version": crate::VERSION
    }))
}

/// Liveness only; does not probe the upstream
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Metrics snapshot, behind the same key check as the search routes
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, GatewayError> {
    state.search.authorize(api_key(&headers))?;

    let metrics = state.metrics.snapshot();
    Ok(Json(StatsResponse {
        cache_hit_rate: metrics.hit_rate(),
        metrics,
        cache_ttl_secs: state.settings.cache.ttl,
        upstream: state.settings.upstream.base_url.clone(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawQueryParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    run(&state, EndpointKind::Search, &headers, &params).await
}

pub async fn news(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawQueryParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    run(&state, EndpointKind::News, &headers, &params).await
}

pub async fn tech(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawQueryParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    run(&state, EndpointKind::Tech, &headers, &params).await
}

pub async fn images(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawQueryParams>,
) -> Result<Json<SearchResponse>, GatewayError> {
    run(&state, EndpointKind::Images, &headers, &params).await
}
