//! HTTP client for the upstream aggregator

use super::response::UpstreamResponse;
use crate::config::UpstreamSettings;
use crate::error::UpstreamError;
use crate::query::{EndpointKind, EngineSelection, QueryDescriptor};
use crate::results::RawHit;
use anyhow::Result;
use reqwest::Client;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What one upstream call produced
#[derive(Debug, Clone, Default)]
pub struct UpstreamFetch {
    pub hits: Vec<RawHit>,
    /// Engines that contributed at least one hit
    pub responded: BTreeSet<String>,
    /// Requested or reported engines that contributed nothing
    pub failed: BTreeSet<String>,
    pub suggestions: Vec<String>,
    /// The deadline expired and the call was abandoned
    pub timed_out: bool,
}

/// Client for a SearXNG instance's JSON search API
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    search_url: String,
    tech_engines: Vec<String>,
}

impl UpstreamClient {
    /// Create a client with custom settings
    pub fn with_settings(settings: &UpstreamSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(format!("clawsearch-rs/{}", crate::VERSION))
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            search_url: format!("{}/search", settings.base_url.trim_end_matches('/')),
            tech_engines: settings.tech_engines.clone(),
        })
    }

    /// Run one query against the upstream within `deadline`.
    ///
    /// A timeout yields an empty fetch with every requested engine marked
    /// failed; only an unreachable or broken upstream is an error.
    pub async fn fetch(
        &self,
        query: &QueryDescriptor,
        deadline: Duration,
    ) -> Result<UpstreamFetch, UpstreamError> {
        let start = Instant::now();
        let params = self.request_params(query);

        let response = match timeout(deadline, self.send(&params)).await {
            Ok(Ok(response)) => response,
            Ok(Err(UpstreamCallError::TimedOut)) | Err(_) => {
                warn!(
                    "Upstream timed out after {:?} for '{}'",
                    start.elapsed(),
                    query.text
                );
                return Ok(Self::timed_out(query));
            }
            Ok(Err(UpstreamCallError::Failed(e))) => return Err(e),
        };

        let hits = response.hits();
        let responded: BTreeSet<String> = hits
            .iter()
            .map(|h| h.engine.clone())
            .filter(|e| !e.is_empty())
            .collect();

        let mut failed: BTreeSet<String> = response.unresponsive().into_iter().collect();
        if let EngineSelection::Only(requested) = &query.engines {
            failed.extend(requested.iter().cloned());
        }
        failed.retain(|e| !responded.contains(e));

        info!(
            "Upstream returned {} hits from {} engines in {:?}",
            hits.len(),
            responded.len(),
            start.elapsed()
        );
        if !failed.is_empty() {
            warn!("Engines without results: {:?}", failed);
        }

        Ok(UpstreamFetch {
            hits,
            responded,
            failed,
            suggestions: response.suggestions(),
            timed_out: false,
        })
    }

    fn timed_out(query: &QueryDescriptor) -> UpstreamFetch {
        let failed = match &query.engines {
            EngineSelection::Only(requested) => requested.iter().cloned().collect(),
            EngineSelection::All => BTreeSet::new(),
        };
        UpstreamFetch {
            failed,
            timed_out: true,
            ..Default::default()
        }
    }

    /// Query string for the upstream; the engine sentinel is resolved here
    fn request_params(&self, query: &QueryDescriptor) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.text.clone()),
            ("format", "json".to_string()),
            ("categories", query.endpoint_kind.category().to_string()),
            ("language", query.lang.clone()),
            ("pageno", query.page.to_string()),
        ];

        if let Some(range) = query.freshness.and_then(|f| f.time_range()) {
            params.push(("time_range", range.to_string()));
        }

        let engines = match &query.engines {
            EngineSelection::Only(_) => query.engines.canonical().join(","),
            EngineSelection::All if query.endpoint_kind == EndpointKind::Tech => {
                self.tech_engines.join(",")
            }
            EngineSelection::All => String::new(),
        };
        if !engines.is_empty() {
            params.push(("engines", engines));
        }

        params
    }

    async fn send(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<UpstreamResponse, UpstreamCallError> {
        debug!("GET {} {:?}", self.search_url, params);

        let response = self
            .client
            .get(&self.search_url)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await
            .map_err(UpstreamCallError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamCallError::Failed(UpstreamError::Status(
                status.as_u16(),
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(UpstreamCallError::from_reqwest)?;

        serde_json::from_slice(&body)
            .map_err(|e| UpstreamCallError::Failed(UpstreamError::Malformed(e.to_string())))
    }
}

enum UpstreamCallError {
    TimedOut,
    Failed(UpstreamError),
}

impl UpstreamCallError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::TimedOut
        } else {
            Self::Failed(UpstreamError::Unreachable(e.to_string()))
        }
    }
}
