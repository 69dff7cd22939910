//! Statement execution through the result cache.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::cache::ResultCache;
use super::guard::ReadOnlyGuard;
use crate::error::Result;
use crate::warehouse::{Statement, Table, Warehouse, WarehouseBackend};

/// Runs statements against one warehouse connection.
///
/// Identical statements (same SQL and parameters) inside the TTL window are
/// answered from the cache without a warehouse round-trip. Failures are
/// returned as-is and never cached; there is no retry.
pub struct QueryRunner {
    warehouse: Arc<dyn Warehouse>,
    guard: ReadOnlyGuard,
    cache: ResultCache,
}

impl QueryRunner {
    pub fn new(warehouse: Arc<dyn Warehouse>, ttl: Duration) -> Self {
        let guard = ReadOnlyGuard::new(warehouse.backend());
        Self {
            warehouse,
            guard,
            cache: ResultCache::new(ttl),
        }
    }

    /// Backend of the underlying connection.
    pub fn backend(&self) -> WarehouseBackend {
        self.warehouse.backend()
    }

    /// Executes `statement`, or returns the cached table for it.
    pub async fn run(&mut self, statement: &Statement) -> Result<Arc<Table>> {
        let key = statement.cache_key();
        if let Some(table) = self.cache.get(&key) {
            debug!("Serving statement from cache");
            return Ok(table);
        }

        self.guard.check(statement.sql())?;

        let table = Arc::new(self.warehouse.execute(statement).await?);
        info!(
            rows = table.row_count(),
            elapsed_ms = table.execution_time.as_millis() as u64,
            "Statement executed"
        );

        self.cache.insert(key, Arc::clone(&table));
        Ok(table)
    }
}

impl std::fmt::Debug for QueryRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRunner")
            .field("backend", &self.backend())
            .field("cached", &self.cache.len())
            .field("ttl", &self.cache.ttl())
            .finish()
    }
}
