//! Configuration management for market-glance.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named warehouse connections and dashboard settings.

use crate::error::{DashError, Result};
use crate::warehouse::WarehouseBackend;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection used when neither the CLI nor the caller names one.
pub const DEFAULT_CONNECTION: &str = "snowflake";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Dashboard behavior (query files, cache, timeouts).
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Named warehouse connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Directory holding the section query files.
    #[serde(default = "default_queries_dir")]
    pub queries_dir: PathBuf,

    /// Maximum age of a cached query result, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Upper bound on a single statement, including result polling.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_queries_dir() -> PathBuf {
    PathBuf::from("queries")
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_query_timeout_secs() -> u64 {
    120
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            queries_dir: default_queries_dir(),
            cache_ttl_secs: default_cache_ttl_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl DashboardConfig {
    /// Returns the cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the statement timeout as a duration.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Warehouse connection configuration.
///
/// Field names follow the credentials file layout (`user_name`, `account`, ...).
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Which warehouse client to use.
    #[serde(default)]
    pub backend: WarehouseBackend,

    /// Login name.
    pub user_name: Option<String>,

    /// Login password (prefer the environment over storing it here).
    pub password: Option<String>,

    /// Snowflake account identifier, e.g. `xy12345.us-east-1`.
    pub account: Option<String>,

    /// Database name.
    pub database: Option<String>,

    /// Schema name.
    pub schema: Option<String>,

    /// Snowflake virtual warehouse.
    pub warehouse: Option<String>,

    /// Role to assume for the session.
    pub role: Option<String>,

    /// Host override (Snowflake endpoint or Postgres server).
    pub host: Option<String>,

    /// Port override (Postgres only).
    pub port: Option<u16>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("backend", &self.backend)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("account", &self.account)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl ConnectionConfig {
    /// Applies environment variables as defaults for unset fields.
    ///
    /// Snowflake reads `SNOWFLAKE_USER`, `SNOWFLAKE_PASSWORD`, `SNOWFLAKE_ACCOUNT`,
    /// `SNOWFLAKE_DATABASE`, `SNOWFLAKE_SCHEMA`, `SNOWFLAKE_WAREHOUSE`, `SNOWFLAKE_ROLE`.
    /// Postgres reads `PGUSER`, `PGPASSWORD`, `PGDATABASE`, `PGHOST`, `PGPORT`.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    /// Applies defaults from an arbitrary variable lookup.
    pub fn apply_defaults_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn fill<F: Fn(&str) -> Option<String>>(slot: &mut Option<String>, key: &str, lookup: &F) {
            if slot.is_none() {
                *slot = lookup(key);
            }
        }

        match self.backend {
            WarehouseBackend::Snowflake => {
                fill(&mut self.user_name, "SNOWFLAKE_USER", &lookup);
                fill(&mut self.password, "SNOWFLAKE_PASSWORD", &lookup);
                fill(&mut self.account, "SNOWFLAKE_ACCOUNT", &lookup);
                fill(&mut self.database, "SNOWFLAKE_DATABASE", &lookup);
                fill(&mut self.schema, "SNOWFLAKE_SCHEMA", &lookup);
                fill(&mut self.warehouse, "SNOWFLAKE_WAREHOUSE", &lookup);
                fill(&mut self.role, "SNOWFLAKE_ROLE", &lookup);
            }
            WarehouseBackend::Postgres => {
                fill(&mut self.user_name, "PGUSER", &lookup);
                fill(&mut self.password, "PGPASSWORD", &lookup);
                fill(&mut self.database, "PGDATABASE", &lookup);
                fill(&mut self.host, "PGHOST", &lookup);
                if self.port.is_none() {
                    self.port = lookup("PGPORT").and_then(|p| p.parse().ok());
                }
            }
        }
    }

    /// Checks that the fields required by the backend are present.
    pub fn validate(&self) -> Result<()> {
        let required: Vec<(&str, &Option<String>)> = match self.backend {
            WarehouseBackend::Snowflake => vec![
                ("account", &self.account),
                ("user_name", &self.user_name),
                ("password", &self.password),
                ("database", &self.database),
                ("warehouse", &self.warehouse),
            ],
            WarehouseBackend::Postgres => vec![("database", &self.database)],
        };

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DashError::config(format!(
                "{} connection is missing required field(s): {}",
                self.backend.as_str(),
                missing.join(", ")
            )))
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("market-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DashError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DashError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or(DEFAULT_CONNECTION);
        self.connections.get(key)
    }
}
