//! Error types for the gateway

use thiserror::Error;

/// Bad client input; rejected before any cache or upstream work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query parameter 'q' is required")]
    MissingQuery,

    #[error("invalid freshness '{0}': expected none, day, week, month or year")]
    InvalidFreshness(String),

    #[error("invalid page '{0}': expected an integer between 1 and 10")]
    InvalidPage(String),

    #[error("invalid language code '{0}'")]
    InvalidLanguage(String),
}

/// The upstream aggregator link failed with no data to fall back to
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("upstream returned a malformed body: {0}")]
    Malformed(String),
}

/// Cache backend failure; never surfaced past the cache manager
#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache store timed out")]
    Timeout,
}

/// Everything a request can fail with
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid or missing API key")]
    Unauthorized,

    #[error(transparent)]
    UpstreamUnavailable(#[from] UpstreamError),
}

impl GatewayError {
    /// Short machine-readable kind for error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}
