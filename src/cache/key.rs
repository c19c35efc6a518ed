//! Cache key derivation

use crate::query::{EngineSelection, QueryDescriptor};
use sha2::{Digest, Sha256};
use std::fmt;

const KEY_VERSION: &str = "v1";
const ALL_ENGINES: &str = "*";

/// SHA-256 fingerprint of a query descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Key under which the entry lives in the store
    pub fn storage_key(&self) -> String {
        format!("clawsearch:{}:{}", KEY_VERSION, self)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Fingerprint a descriptor.
///
/// Engines are hashed in sorted order, so request order does not matter.
/// Every field is length-prefixed to keep adjacent fields from aliasing.
pub fn fingerprint(query: &QueryDescriptor) -> CacheKey {
    let mut hasher = Sha256::new();

    let engines = match &query.engines {
        EngineSelection::All => ALL_ENGINES.to_string(),
        EngineSelection::Only(_) => query.engines.canonical().join(","),
    };
    // Keyed on what reaches the upstream: no filter and `none` are the same.
    let freshness = query.freshness.and_then(|f| f.time_range()).unwrap_or("");
    let page = query.page.to_string();

    for field in [
        KEY_VERSION,
        query.endpoint_kind.as_str(),
        query.text.as_str(),
        engines.as_str(),
        freshness,
        query.lang.as_str(),
        page.as_str(),
    ] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }

    CacheKey(hasher.finalize().into())
}
