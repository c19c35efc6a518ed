//! Caching module for ClawSearch-RS
//!
//! Fingerprints queries, stores finished result sets with a TTL, and keeps
//! serving (uncached) when the store misbehaves.

mod key;
mod manager;
mod store;

pub use key::{fingerprint, CacheKey};
pub use manager::{CacheLookup, CacheManager};
pub use store::{CacheStore, MemoryStore};

#[cfg(test)]
pub(crate) use manager::tests::BrokenStore;
