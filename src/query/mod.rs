//! Query normalization
//!
//! Turns raw request parameters into a canonical [`QueryDescriptor`]:
//! - `q`: trimmed, inner whitespace collapsed, must be non-empty
//! - `engines`: comma-separated, unknown ids dropped, empty means all engines
//! - `freshness`: `none`, `day`, `week`, `month` or `year`
//! - `lang`: lower-cased language tag, `en` when absent
//! - `page`: integer in `1..=10`

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Highest page a client may request
pub const MAX_PAGE: u32 = 10;

/// Language used when the request names none
pub const DEFAULT_LANG: &str = "en";

const MAX_LANG_LEN: usize = 35;

/// Query parameters exactly as the client sent them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQueryParams {
    pub q: Option<String>,
    pub engines: Option<String>,
    pub freshness: Option<String>,
    pub lang: Option<String>,
    pub page: Option<String>,
}

impl RawQueryParams {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    pub fn with_engines(mut self, engines: impl Into<String>) -> Self {
        self.engines = Some(engines.into());
        self
    }

    pub fn with_freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = Some(freshness.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

/// Which upstream result family a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Search,
    News,
    Tech,
    Images,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::News => "news",
            Self::Tech => "tech",
            Self::Images => "images",
        }
    }

    /// SearXNG category this endpoint maps to
    pub fn category(&self) -> &'static str {
        match self {
            Self::Search => "general",
            Self::News => "news",
            Self::Tech => "it",
            Self::Images => "images",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recency filter passed through to the upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    None,
    Day,
    Week,
    Month,
    Year,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Value for the upstream `time_range` parameter, if any
    pub fn time_range(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            other => Some(other.as_str()),
        }
    }
}

impl std::str::FromStr for Freshness {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(ValidationError::InvalidFreshness(s.to_string())),
        }
    }
}

/// Engines a query should run on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSelection {
    /// Whatever the upstream has enabled at fetch time
    All,
    /// Explicit engines in request order, no duplicates
    Only(Vec<String>),
}

impl EngineSelection {
    /// Engine ids in lexicographic order; empty for `All`
    pub fn canonical(&self) -> Vec<&str> {
        match self {
            Self::All => Vec::new(),
            Self::Only(engines) => {
                let mut sorted: Vec<&str> = engines.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                sorted
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// A validated, canonical query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub text: String,
    pub engines: EngineSelection,
    pub freshness: Option<Freshness>,
    pub lang: String,
    pub page: u32,
    pub endpoint_kind: EndpointKind,
}

impl QueryDescriptor {
    /// Descriptor with defaults for everything but the text
    pub fn simple(text: impl Into<String>, kind: EndpointKind) -> Self {
        Self {
            text: text.into(),
            engines: EngineSelection::All,
            freshness: None,
            lang: DEFAULT_LANG.to_string(),
            page: 1,
            endpoint_kind: kind,
        }
    }

    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = EngineSelection::Only(engines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = Some(freshness);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Validates raw parameters against the configured engine list
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    known_engines: HashSet<String>,
}

impl QueryNormalizer {
    pub fn new<I, S>(known_engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known_engines: known_engines
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Build a descriptor or report the first invalid parameter
    pub fn normalize(
        &self,
        raw: &RawQueryParams,
        kind: EndpointKind,
    ) -> Result<QueryDescriptor, ValidationError> {
        let text = normalize_text(raw.q.as_deref()).ok_or(ValidationError::MissingQuery)?;
        let engines = self.parse_engines(raw.engines.as_deref());
        let freshness = parse_freshness(raw.freshness.as_deref(), kind)?;
        let lang = parse_lang(raw.lang.as_deref())?;
        let page = parse_page(raw.page.as_deref())?;

        Ok(QueryDescriptor {
            text,
            engines,
            freshness,
            lang,
            page,
            endpoint_kind: kind,
        })
    }

    fn parse_engines(&self, raw: Option<&str>) -> EngineSelection {
        let mut seen = HashSet::new();
        let engines: Vec<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty() && self.known_engines.contains(e))
            .filter(|e| seen.insert(e.clone()))
            .collect();

        if engines.is_empty() {
            EngineSelection::All
        } else {
            EngineSelection::Only(engines)
        }
    }
}

fn normalize_text(raw: Option<&str>) -> Option<String> {
    let text = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn parse_freshness(
    raw: Option<&str>,
    kind: EndpointKind,
) -> Result<Option<Freshness>, ValidationError> {
    let is_news = kind == EndpointKind::News;
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        // Outside news, an explicit `none` is the same as no filter at all.
        Some(value) => match value.parse::<Freshness>()? {
            Freshness::None if !is_news => Ok(None),
            freshness => Ok(Some(freshness)),
        },
        // News without an explicit window means today's news.
        None if is_news => Ok(Some(Freshness::Day)),
        None => Ok(None),
    }
}

fn parse_lang(raw: Option<&str>) -> Result<String, ValidationError> {
    let lang = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(lang) => lang.to_lowercase(),
        None => return Ok(DEFAULT_LANG.to_string()),
    };

    let well_formed = lang.len() <= MAX_LANG_LEN
        && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if well_formed {
        Ok(lang)
    } else {
        Err(ValidationError::InvalidLanguage(lang))
    }
}

fn parse_page(raw: Option<&str>) -> Result<u32, ValidationError> {
    let raw = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw,
        None => return Ok(1),
    };

    match raw.parse::<u32>() {
        Ok(page) if (1..=MAX_PAGE).contains(&page) => Ok(page),
        _ => Err(ValidationError::InvalidPage(raw.to_string())),
    }
}
