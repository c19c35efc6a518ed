//! Settings structures for ClawSearch-RS configuration

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub auth: AuthSettings,
    pub cache: CacheSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SEARXNG_URL") {
            self.upstream.base_url = val;
        }
        if let Some(val) = lookup("CLAWSEARCH_API_KEYS") {
            self.auth.api_keys = parse_key_list(&val);
        }
        if let Some(val) = lookup("CLAWSEARCH_CACHE_TTL") {
            if let Ok(ttl) = val.trim().parse() {
                self.cache.ttl = ttl;
            }
        }
        if let Some(val) = lookup("CLAWSEARCH_PORT") {
            if let Ok(port) = val.trim().parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("CLAWSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = lookup("CLAWSEARCH_UPSTREAM_TIMEOUT") {
            if let Ok(timeout) = val.trim().parse() {
                self.upstream.timeout = timeout;
            }
        }
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = Url::parse(&self.upstream.base_url) {
            bail!("invalid upstream base_url '{}': {}", self.upstream.base_url, e);
        }
        if !(self.upstream.timeout.is_finite() && self.upstream.timeout > 0.0) {
            bail!("upstream timeout must be positive, got {}", self.upstream.timeout);
        }
        self.upstream.deadline()?;
        if self.upstream.engines.is_empty() {
            bail!("upstream engine list must not be empty");
        }
        if self.cache.ttl == 0 {
            bail!("cache ttl must be at least one second");
        }
        Ok(())
    }
}

/// Split a comma-separated key list, dropping blanks
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
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

/// Upstream aggregator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL of the SearXNG instance
    pub base_url: String,
    /// Hard deadline for one upstream call, in seconds
    pub timeout: f64,
    /// Engine ids clients may name in `engines=`
    pub engines: Vec<String>,
    /// Engines the tech endpoint uses when none are requested
    pub tech_engines: Vec<String>,
    /// Idle connections kept per host
    pub pool_maxsize: usize,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// Proxy for all upstream traffic
    pub proxy: Option<String>,
}

impl UpstreamSettings {
    /// The timeout as a `Duration`; fails for values no `Duration` can hold
    pub fn deadline(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout)
            .map_err(|e| anyhow!("invalid upstream timeout {}: {}", self.timeout, e))
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
            timeout: 30.0,
            engines: default_engines(),
            tech_engines: ["github", "stackoverflow", "hackernews", "google"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pool_maxsize: 20,
            verify_ssl: true,
            proxy: None,
        }
    }
}

/// API key settings; an empty list disables auth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub api_keys: Vec<String>,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry lifetime in seconds
    pub ttl: u64,
    /// Maximum number of cached result sets
    pub max_capacity: u64,
    /// Bound on one cache store round trip, in milliseconds
    pub store_timeout_ms: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: 300,
            max_capacity: 10_000,
            store_timeout_ms: 250,
        }
    }
}

fn default_engines() -> Vec<String> {
    [
        "google",
        "bing",
        "duckduckgo",
        "brave",
        "qwant",
        "startpage",
        "mojeek",
        "wikipedia",
        "github",
        "stackoverflow",
        "hackernews",
        "arxiv",
        "google news",
        "bing news",
        "google images",
        "bing images",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
