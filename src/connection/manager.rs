//! Connection manager for the warehouse session lifecycle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::warehouse::{self, Warehouse};

/// The open warehouse connection and the name it was configured under.
pub struct ActiveConnection {
    pub name: String,
    pub warehouse: Arc<dyn Warehouse>,
}

/// Holds at most one warehouse connection for the whole session.
///
/// A failed connect leaves the manager without a connection; nothing retries.
/// `close` must be called before the process exits.
#[derive(Default)]
pub struct ConnectionManager {
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager around an already open warehouse (mocks, tests).
    pub fn with_warehouse(name: impl Into<String>, warehouse: Arc<dyn Warehouse>) -> Self {
        Self {
            active: Some(ActiveConnection {
                name: name.into(),
                warehouse,
            }),
        }
    }

    /// Opens a connection using the named configuration.
    ///
    /// Any previous connection is closed first.
    pub async fn connect(
        &mut self,
        name: &str,
        config: &ConnectionConfig,
        query_timeout: Duration,
    ) -> Result<Arc<dyn Warehouse>> {
        self.close().await?;

        info!(connection = name, backend = config.backend.as_str(), "Connecting to warehouse");
        let warehouse = warehouse::connect(config, query_timeout).await?;

        self.active = Some(ActiveConnection {
            name: name.to_string(),
            warehouse: Arc::clone(&warehouse),
        });
        Ok(warehouse)
    }

    /// The open warehouse, if any.
    pub fn warehouse(&self) -> Option<Arc<dyn Warehouse>> {
        self.active.as_ref().map(|c| Arc::clone(&c.warehouse))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.name.as_str())
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Short description safe to display: backend and connection name only.
    pub fn label(&self) -> String {
        match &self.active {
            Some(conn) => format!("{} ({})", conn.name, conn.warehouse.backend().as_str()),
            None => "not connected".to_string(),
        }
    }

    /// Releases the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.active.take() {
            if let Err(e) = conn.warehouse.close().await {
                warn!("Error while closing connection '{}': {}", conn.name, e);
                return Err(e);
            }
            info!("Closed connection '{}'", conn.name);
        }
        Ok(())
    }
}
