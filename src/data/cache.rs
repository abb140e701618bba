//! Bounded memo of feed results keyed by query signature.
//!
//! Capacity-limited with least-recently-used eviction and an optional TTL.
//! A single mutex covers lookup, fetch and insert, so two concurrent misses on
//! the same signature only reach the upstream once.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::FeedConfig;
use crate::data::feed::FeedSource;
use crate::domain::{ProductionTable, QuerySignature};
use crate::error::FeedError;

#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<ProductionTable>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_stale(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.fetched_at.elapsed() >= ttl)
    }
}

pub struct QueryCache<S> {
    source: S,
    entries: Mutex<LruCache<QuerySignature, CacheEntry>>,
    ttl: Option<Duration>,
}

impl<S: FeedSource> QueryCache<S> {
    pub fn new(source: S, capacity: NonZeroUsize) -> Self {
        Self {
            source,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: None,
        }
    }

    pub fn from_config(source: S, config: &FeedConfig) -> Self {
        Self::new(source, config.cache_capacity).with_ttl(config.cache_ttl)
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Return the cached table for `query`, fetching it on a miss.
    ///
    /// Failed fetches are not cached.
    pub fn get_or_fetch(&self, query: &QuerySignature) -> Result<Arc<ProductionTable>, FeedError> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(query) {
            if !entry.is_stale(self.ttl) {
                debug!(categories = ?query.categories(), "query cache hit");
                return Ok(Arc::clone(&entry.table));
            }
            debug!("query cache entry expired");
        }

        debug!(categories = ?query.categories(), "query cache miss");
        let table = Arc::new(self.source.fetch(query)?);
        entries.put(
            query.clone(),
            CacheEntry {
                table: Arc::clone(&table),
                fetched_at: Instant::now(),
            },
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
