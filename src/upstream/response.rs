//! SearXNG JSON response shapes
//!
//! The upstream is untrusted: every field is optional, and a hit that fails
//! to decode is skipped instead of failing the whole response.

use crate::results::RawHit;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UpstreamResponse {
    pub results: Vec<Value>,
    pub suggestions: Vec<Value>,
    pub unresponsive_engines: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpstreamHit {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
    engine: Option<String>,
    engines: Vec<String>,
    /// Any JSON; non-numeric scores become `None`
    score: Option<Value>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    thumbnail: Option<String>,
    img_src: Option<String>,
}

impl UpstreamResponse {
    /// Hits that carry a URL, in upstream order
    pub fn hits(&self) -> Vec<RawHit> {
        self.results
            .iter()
            .filter_map(|value| match serde_json::from_value::<UpstreamHit>(value.clone()) {
                Ok(hit) => hit.into_raw(),
                Err(e) => {
                    debug!("Skipping malformed upstream hit: {}", e);
                    None
                }
            })
            .collect()
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.suggestions
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Engine names the upstream reports as failed.
    ///
    /// SearXNG sends `[name, reason]` pairs; bare names are accepted too.
    pub fn unresponsive(&self) -> Vec<String> {
        self.unresponsive_engines
            .iter()
            .filter_map(|v| match v {
                Value::String(name) => Some(name.clone()),
                Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl UpstreamHit {
    fn into_raw(self) -> Option<RawHit> {
        let url = self.url.filter(|u| !u.trim().is_empty())?;
        let engine = self
            .engine
            .or_else(|| self.engines.into_iter().next())
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        Some(RawHit {
            title: self.title.unwrap_or_default(),
            url,
            snippet: self.content.unwrap_or_default(),
            engine,
            score: self.score.as_ref().and_then(Value::as_f64),
            published: self.published_date,
            thumbnail: self.thumbnail.or(self.img_src).filter(|t| !t.is_empty()),
        })
    }
}
