//! URL canonicalization for deduplication

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const TRACKING_PARAMS: &[&str] = &[
    // Google
    "gclid",
    "gclsrc",
    "dclid",
    // Facebook
    "fbclid",
    "fb_action_ids",
    "fb_action_types",
    "fb_source",
    "fb_ref",
    // Microsoft
    "msclkid",
    // Twitter
    "twclid",
    // Mailchimp
    "mc_eid",
    "mc_cid",
    // HubSpot
    "_hsenc",
    "_hsmi",
    "__hstc",
    "__hsfp",
    "hsctatracking",
    // Adobe
    "s_kwcid",
    // Yandex
    "yclid",
    // General
    "ref_src",
    "click_id",
    "campaign_id",
    "ad_id",
];

static TRACKING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^utm_", r"^_ga", r"^pk_"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&name.as_str()) || TRACKING_PATTERNS.iter().any(|p| p.is_match(&name))
}

/// Canonical form of a result URL.
///
/// Scheme and host are lower-cased and default ports dropped by the parser;
/// the fragment, tracking parameters and trailing slashes are removed.
/// Input that does not parse as an absolute URL is only trimmed.
/// Applying this twice yields the same string as applying it once.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => return trimmed.to_string(),
    };

    url.set_fragment(None);

    // Kept pairs are always re-encoded: one query string, one spelling.
    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !is_tracking_param(k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    if !url.cannot_be_a_base() {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let stripped = path.trim_end_matches('/').to_string();
            url.set_path(&stripped);
        }
    }

    let bare_root = !url.cannot_be_a_base() && url.path() == "/" && url.query().is_none();
    let mut out = String::from(url);
    // The parser always renders an empty path as "/"; drop it for bare hosts.
    if bare_root && out.ends_with('/') {
        out.pop();
    }
    out
}
