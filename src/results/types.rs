//! Result type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A hit as the upstream reported it, before canonicalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub engine: String,
    pub score: Option<f64>,
    pub published: Option<String>,
    pub thumbnail: Option<String>,
}

impl RawHit {
    pub fn new(url: impl Into<String>, title: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: String::new(),
            engine: engine.into(),
            score: None,
            published: None,
            thumbnail: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }
}

impl From<&SearchResult> for RawHit {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            snippet: result.snippet.clone(),
            engine: result.engine.clone(),
            score: result.score,
            published: result.published.clone(),
            thumbnail: result.thumbnail.clone(),
        }
    }
}

/// A normalized, deduplicated search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    /// Canonical URL; the deduplication identity
    pub url: String,
    pub snippet: String,
    /// Engine of the first hit seen for this URL
    pub engine: String,
    pub score: Option<f64>,
    /// RFC 3339 publication time
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// The cached outcome of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Distinct canonical URLs
    pub total: usize,
    /// Engines that contributed at least one hit
    pub engines_used: BTreeSet<String>,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ResultSet {
    pub fn new(query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        Self {
            query: query.into(),
            total: results.len(),
            engines_used: BTreeSet::new(),
            results,
            suggestions: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_engines_used(mut self, engines: BTreeSet<String>) -> Self {
        self.engines_used = engines;
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}
