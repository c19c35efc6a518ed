//! Fail-open result cache

use super::key::CacheKey;
use super::store::CacheStore;
use crate::config::CacheSettings;
use crate::error::CacheStoreError;
use crate::results::ResultSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(ResultSet),
    Miss,
}

/// Reads and writes result sets; store failures degrade to uncached operation
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
    op_timeout: Duration,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            store,
            default_ttl,
            op_timeout,
        }
    }

    pub fn with_settings(store: Arc<dyn CacheStore>, settings: &CacheSettings) -> Self {
        Self::new(store, settings.ttl(), settings.store_timeout())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a result set; any store or decode failure is a miss
    pub async fn get(&self, key: &CacheKey) -> CacheLookup {
        let storage_key = key.storage_key();

        let bytes = match self.bounded(self.store.get(&storage_key)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("Cache miss for {}", key);
                return CacheLookup::Miss;
            }
            Err(e) => {
                warn!("Cache read failed, treating as miss: {}", e);
                return CacheLookup::Miss;
            }
        };

        match serde_json::from_slice::<ResultSet>(&bytes) {
            Ok(set) => {
                debug!("Cache hit for {}", key);
                CacheLookup::Hit(set)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                CacheLookup::Miss
            }
        }
    }

    /// Store a complete result set; failures are logged and swallowed
    pub async fn put(&self, key: &CacheKey, value: &ResultSet, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode result set for {}: {}", key, e);
                return;
            }
        };

        match self
            .bounded(self.store.set(&key.storage_key(), bytes, ttl))
            .await
        {
            Ok(()) => debug!("Cached {} for {:?}", key, ttl),
            Err(e) => warn!("Cache write failed, continuing uncached: {}", e),
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheStoreError>
    where
        F: Future<Output = Result<T, CacheStoreError>>,
    {
        timeout(self.op_timeout, op)
            .await
            .unwrap_or(Err(CacheStoreError::Timeout))
    }
}
