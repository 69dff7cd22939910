//! Connection integration tests.
//!
//! Tests configuration handling and, when a database is available, a live
//! Postgres round-trip through the query runner.

use market_glance::config::{Config, ConnectionConfig};
use market_glance::connection::ConnectionManager;
use market_glance::query::QueryRunner;
use market_glance::warehouse::{MockWarehouse, Statement, Value, WarehouseBackend};
use std::sync::Arc;
use std::time::Duration;

/// Helper to build a Postgres config from the `PG*` environment.
fn postgres_config_from_env() -> Option<ConnectionConfig> {
    std::env::var("PGDATABASE").ok()?;
    let mut config = ConnectionConfig {
        backend: WarehouseBackend::Postgres,
        ..ConnectionConfig::default()
    };
    config.apply_env_defaults();
    Some(config)
}

#[tokio::test]
async fn test_postgres_select_through_runner() {
    let Some(config) = postgres_config_from_env() else {
        eprintln!("Skipping test: PGDATABASE not set");
        return;
    };

    let mut manager = ConnectionManager::new();
    let warehouse = manager
        .connect("local", &config, Duration::from_secs(30))
        .await
        .unwrap();
    let mut runner = QueryRunner::new(warehouse, Duration::from_secs(60));

    let statement = Statement::new("SELECT $1::text AS ticker, 42 AS shares").bind("ABC");
    let table = runner.run(&statement).await.unwrap();

    assert_eq!(table.row_count(), 1);
    assert_eq!(table.column_index("ticker"), Some(0));
    assert_eq!(table.rows[0][0], Value::from("ABC"));
    assert_eq!(table.rows[0][1].as_f64(), Some(42.0));

    manager.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_unreachable_host_fails_once() {
    let config = ConnectionConfig {
        backend: WarehouseBackend::Postgres,
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: Some(5432),
        database: Some("market".to_string()),
        user_name: Some("analyst".to_string()),
        password: Some("secret".to_string()),
        ..ConnectionConfig::default()
    };

    let mut manager = ConnectionManager::new();
    let result = tokio::time::timeout(
        Duration::from_secs(30),
        manager.connect("broken", &config, Duration::from_secs(5)),
    )
    .await
    .expect("connect should give up on its own");

    let err = result.err().unwrap();
    assert_eq!(err.category(), "Connection Error");
    assert!(!err.to_string().contains("secret"));
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_incomplete_snowflake_config_is_rejected_before_connecting() {
    let config = ConnectionConfig {
        account: Some("xy12345.us-east-1".to_string()),
        user_name: Some("analyst".to_string()),
        ..ConnectionConfig::default()
    };

    let mut manager = ConnectionManager::new();
    let err = manager
        .connect("snowflake", &config, Duration::from_secs(5))
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), "Configuration Error");
    assert!(err.to_string().contains("password"));
    assert!(err.to_string().contains("warehouse"));
}

#[tokio::test]
async fn test_close_releases_the_warehouse() {
    let mock = Arc::new(MockWarehouse::demo());
    let mut manager = ConnectionManager::with_warehouse("mock", mock.clone());
    assert_eq!(manager.label(), "mock (snowflake)");

    manager.close().await.unwrap();
    assert!(mock.is_closed());
    assert!(!manager.is_connected());
    assert_eq!(manager.label(), "not connected");
}

#[test]
fn test_config_file_with_named_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[dashboard]
queries_dir = "/srv/market/queries"
cache_ttl_secs = 60

[connections.snowflake]
account = "xy12345.us-east-1"
user_name = "analyst"
database = "FINANCE"
warehouse = "COMPUTE_WH"

[connections.local]
backend = "postgres"
host = "localhost"
port = 5433
database = "market"
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.dashboard.cache_ttl(), Duration::from_secs(60));
    assert_eq!(config.dashboard.query_timeout(), Duration::from_secs(120));

    let default = config.get_connection(None).unwrap();
    assert_eq!(default.backend, WarehouseBackend::Snowflake);
    assert_eq!(default.database.as_deref(), Some("FINANCE"));

    let local = config.get_connection(Some("local")).unwrap();
    assert_eq!(local.backend, WarehouseBackend::Postgres);
    assert_eq!(local.port, Some(5433));
    assert!(config.get_connection(Some("staging")).is_none());
}

#[test]
fn test_malformed_config_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[dashboard]\ncache_ttl_secs = \"ten\"\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
    assert!(err.to_string().contains("config.toml"));
}
