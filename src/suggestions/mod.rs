//! Related-query suggestions
//!
//! Suggestions are derived from terms that recur across result titles and
//! snippets, then merged with whatever the upstream offered itself.

use crate::results::SearchResult;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Maximum number of suggestions returned for one query
pub const MAX_SUGGESTIONS: usize = 5;

const MIN_TOKEN_LEN: usize = 3;
const MIN_OCCURRENCES: usize = 2;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "you",
        "your", "how", "what", "when", "where", "which", "who", "why", "will", "can", "has",
        "have", "had", "not", "but", "all", "any", "its", "our", "out", "use", "using", "into",
        "about", "more", "most", "than", "then", "them", "they", "their", "there", "these",
        "those", "also", "just", "been", "being", "over", "such", "some", "only", "other",
        "each", "may", "new", "one", "two", "get", "via", "www", "http", "https", "com", "org",
        "html",
    ]
    .into_iter()
    .collect()
});

/// Derive up to [`MAX_SUGGESTIONS`] related queries from a result list.
///
/// Deterministic: candidates are ranked by frequency, then by the position
/// of their first occurrence.
pub fn suggest(query: &str, results: &[SearchResult]) -> Vec<String> {
    let query_lower = query.to_lowercase();
    // token -> (count, first-seen position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut position = 0usize;

    for result in results {
        for text in [&result.title, &result.snippet] {
            for token in tokenize(text) {
                if !is_candidate(&token, &query_lower) {
                    continue;
                }
                let entry = counts.entry(token).or_insert((0, position));
                entry.0 += 1;
                position += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= MIN_OCCURRENCES)
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(token, _, _)| format!("{} {}", query, token))
        .collect()
}

/// Upstream suggestions first, then derived ones; no repeats, never the query itself
pub fn merge(query: &str, upstream: &[String], derived: &[String], cap: usize) -> Vec<String> {
    let query_key = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    upstream
        .iter()
        .chain(derived)
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let key = s.to_lowercase();
            key != query_key && seen.insert(key)
        })
        .take(cap)
        .collect()
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn is_candidate(token: &str, query_lower: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_LEN
        && !token.chars().all(|c| c.is_numeric())
        && !STOPWORDS.contains(token)
        && !query_lower.contains(token)
}
