//! Time-to-live result cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::warehouse::Table;

#[derive(Debug)]
struct CachedResult {
    table: Arc<Table>,
    cached_at: Instant,
}

impl CachedResult {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }
}

/// Results keyed by statement, each valid for a fixed TTL after it was stored.
///
/// There is no explicit invalidation; an entry lives until it expires and is
/// replaced by the next fetch.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: HashMap<String, CachedResult>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached table for `key` if it has not expired.
    ///
    /// Expired entries are evicted on lookup.
    pub fn get(&mut self, key: &str) -> Option<Arc<Table>> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => Some(Arc::clone(&entry.table)),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: String, table: Arc<Table>) {
        self.entries.insert(
            key,
            CachedResult {
                table,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
