//! Metrics collection module
//!
//! Tracks cache effectiveness, upstream health and rejected requests.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Process-wide counters
#[derive(Debug, Default)]
pub struct Metrics {
    searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_unavailable: AtomicU64,
    upstream_timeouts: AtomicU64,
    auth_denied: AtomicU64,
    validation_failed: AtomicU64,
    /// Failure count per engine
    engine_failures: Mutex<BTreeMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache(&self, hit: bool) {
        let counter = if hit { &self.cache_hits } else { &self.cache_misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_unavailable(&self) {
        self.upstream_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_timeout(&self) {
        self.upstream_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_denied(&self) {
        self.auth_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failed(&self) {
        self.validation_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_failures<'a, I>(&self, engines: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut failures = self
            .engine_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for engine in engines {
            *failures.entry(engine.clone()).or_insert(0) += 1;
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let engine_failures = self
            .engine_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_unavailable: self.upstream_unavailable.load(Ordering::Relaxed),
            upstream_timeouts: self.upstream_timeouts.load(Ordering::Relaxed),
            auth_denied: self.auth_denied.load(Ordering::Relaxed),
            validation_failed: self.validation_failed.load(Ordering::Relaxed),
            engine_failures,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_unavailable: u64,
    pub upstream_timeouts: u64,
    pub auth_denied: u64,
    pub validation_failed: u64,
    pub engine_failures: BTreeMap<String, u64>,
}

impl MetricsSnapshot {
    /// Share of lookups served from cache, in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }
}
