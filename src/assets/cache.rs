//! Cache of rewritten asset bodies.
//!
//! Keyed by base path *and* asset path, so one process can serve several
//! prefixes (or change prefix on reload) without handing out output rewritten
//! for a different mount.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Bytes;
use dashmap::DashMap;
use serde::Serialize;

use crate::basepath::BasePath;
use crate::observability::metrics;
use crate::rewrite::RewriteReport;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub base_path: BasePath,
    pub path: String,
}

impl CacheKey {
    pub fn new(base_path: &BasePath, path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.clone(),
            path: path.into(),
        }
    }
}

/// A rewritten body plus the source file identity it was built from.
#[derive(Debug, Clone)]
pub struct CachedAsset {
    pub body: Bytes,
    pub report: RewriteReport,
    pub source_len: u64,
    pub source_modified: Option<SystemTime>,
}

impl CachedAsset {
    /// True while the source file still has the recorded length and mtime.
    pub fn is_fresh(&self, len: u64, modified: Option<SystemTime>) -> bool {
        self.source_len == len && self.source_modified == modified
    }
}

/// Snapshot of cache counters for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// A thread-safe, bounded cache of rewritten assets.
#[derive(Debug, Clone)]
pub struct RewriteCache {
    inner: Arc<DashMap<CacheKey, CachedAsset>>,
    capacity: usize,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl RewriteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            capacity,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Look up a fresh entry. Stale entries are dropped and count as a miss.
    pub fn get(&self, key: &CacheKey, len: u64, modified: Option<SystemTime>) -> Option<CachedAsset> {
        let found = self
            .inner
            .get(key)
            .map(|entry| (entry.is_fresh(len, modified), entry.value().clone()));

        match found {
            Some((true, asset)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(true);
                Some(asset)
            }
            Some((false, _)) => {
                self.inner.remove(key);
                tracing::debug!(path = %key.path, base_path = %key.base_path, "Dropping stale rewrite");
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(false);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Store an entry. Returns false when the cache is full.
    pub fn insert(&self, key: CacheKey, asset: CachedAsset) -> bool {
        if self.inner.len() >= self.capacity && !self.inner.contains_key(&key) {
            tracing::debug!(path = %key.path, capacity = self.capacity, "Rewrite cache full, not caching");
            return false;
        }
        self.inner.insert(key, asset);
        true
    }

    /// Drop every entry, returning how many were removed.
    pub fn purge(&self) -> usize {
        let evicted = self.inner.len();
        self.inner.clear();
        tracing::info!(evicted, "Rewrite cache purged");
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
