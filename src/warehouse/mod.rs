//! Warehouse abstraction layer.
//!
//! Provides a trait-based interface for running statements against a data
//! warehouse, so the dashboard can target Snowflake, Postgres, or an
//! in-memory mock interchangeably.

mod mock;
mod postgres;
mod snowflake;
mod statement;
mod types;

pub use mock::{FailingWarehouse, MockWarehouse};
pub use postgres::PostgresWarehouse;
pub use snowflake::SnowflakeWarehouse;
pub use statement::Statement;
pub use types::{ColumnInfo, Row, Table, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Supported warehouse backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    #[default]
    Snowflake,
    Postgres,
}

impl WarehouseBackend {
    /// Returns the backend as a string for display and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::Postgres => "postgres",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snowflake" => Some(Self::Snowflake),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Returns the placeholder for the `n`th (1-based) bound parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Snowflake => "?".to_string(),
            Self::Postgres => format!("${n}"),
        }
    }
}

/// Creates a warehouse client for the given configuration.
///
/// This is the central factory for warehouse connections. The configuration
/// is validated before any network traffic happens.
pub async fn connect(
    config: &ConnectionConfig,
    query_timeout: Duration,
) -> Result<Arc<dyn Warehouse>> {
    config.validate()?;
    match config.backend {
        WarehouseBackend::Snowflake => {
            let client = SnowflakeWarehouse::connect(config, query_timeout).await?;
            Ok(Arc::new(client))
        }
        WarehouseBackend::Postgres => {
            let client = PostgresWarehouse::connect(config, query_timeout).await?;
            Ok(Arc::new(client))
        }
    }
}

/// Interface implemented by every warehouse client.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// The backend this client talks to (drives placeholder syntax and SQL dialect).
    fn backend(&self) -> WarehouseBackend;

    /// Executes a statement and returns the full result table.
    async fn execute(&self, statement: &Statement) -> Result<Table>;

    /// Releases the connection. Further calls to `execute` fail.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(WarehouseBackend::parse("Snowflake"), Some(WarehouseBackend::Snowflake));
        assert_eq!(WarehouseBackend::parse("postgresql"), Some(WarehouseBackend::Postgres));
        assert_eq!(WarehouseBackend::parse("mysql"), None);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(WarehouseBackend::Snowflake.placeholder(1), "?");
        assert_eq!(WarehouseBackend::Postgres.placeholder(2), "$2");
    }

    #[tokio::test]
    async fn test_connect_validates_before_network() {
        let config = ConnectionConfig::default();
        let err = connect(&config, Duration::from_secs(1)).await.err().unwrap();
        assert_eq!(err.category(), "Configuration Error");
    }
}
