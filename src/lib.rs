//! ClawSearch-RS: a private meta-search API gateway
//!
//! Sits in front of a SearXNG instance, normalizes queries, caches result
//! sets, deduplicates hits and derives related-query suggestions.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod results;
pub mod search;
pub mod suggestions;
pub mod upstream;
pub mod web;

pub use config::Settings;
pub use error::GatewayError;
pub use results::{ResultSet, SearchResult};
pub use search::{Search, SearchResponse};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
