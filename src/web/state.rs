//! Application state shared across handlers

use crate::cache::{CacheStore, MemoryStore};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::Search;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<Search>,
    /// Process-wide counters
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state backed by the in-process cache
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new(settings.cache.max_capacity));
        Self::with_store(settings, store)
    }

    /// Create new application state over any cache backend
    pub fn with_store(settings: Settings, store: Arc<dyn CacheStore>) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let search = Arc::new(Search::new(&settings, store, metrics.clone())?);

        Ok(Self {
            settings: Arc::new(settings),
            search,
            metrics,
        })
    }
}
