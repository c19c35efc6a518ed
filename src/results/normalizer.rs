//! Deduplication and ordering of raw upstream hits

use super::canonical::canonicalize_url;
use super::types::{RawHit, SearchResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Collapse hits sharing a canonical URL and order the survivors.
///
/// The first hit seen for a URL supplies title, snippet and engine; the
/// merged score is the maximum score in the group. Output is stable-sorted
/// by descending score when any score is present, otherwise upstream order
/// is kept. Already-normalized input comes back unchanged.
pub fn normalize(hits: Vec<RawHit>) -> Vec<SearchResult> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut results: Vec<SearchResult> = Vec::new();

    for hit in hits {
        let url = canonicalize_url(&hit.url);
        if url.is_empty() {
            continue;
        }
        let published = hit.published.as_deref().and_then(normalize_timestamp);
        let score = hit.score.filter(|s| s.is_finite());

        match index.get(&url) {
            Some(&pos) => {
                let existing = &mut results[pos];
                existing.score = max_score(existing.score, score);
                if existing.published.is_none() {
                    existing.published = published;
                }
                if existing.thumbnail.is_none() {
                    existing.thumbnail = hit.thumbnail;
                }
            }
            None => {
                index.insert(url.clone(), results.len());
                results.push(SearchResult {
                    title: hit.title.trim().to_string(),
                    url,
                    snippet: hit.snippet.trim().to_string(),
                    engine: hit.engine,
                    score,
                    published,
                    thumbnail: hit.thumbnail,
                });
            }
        }
    }

    if results.iter().any(|r| r.score.is_some()) {
        // Vec::sort_by is stable, so equal scores keep first-seen order.
        results.sort_by(|a, b| compare_scores(b.score, a.score));
    }

    results
}

fn max_score(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Missing scores rank below any present score
fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Render an upstream date as RFC 3339 UTC, or drop it
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed: DateTime<Utc> = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.with_timezone(&Utc)
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.and_utc()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        dt.and_utc()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?.and_utc()
    } else {
        return None;
    };

    Some(parsed.to_rfc3339_opts(SecondsFormat::Secs, true))
}
