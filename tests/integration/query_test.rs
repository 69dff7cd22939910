//! Query file and query runner integration tests.

use market_glance::query::{load_query_from_file, QueryFile, QueryRunner, ReadOnlyGuard};
use market_glance::warehouse::{MockWarehouse, Statement, WarehouseBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_query_file_contents_are_returned_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.sql");
    let sql = "  -- leading comment\r\nSELECT 1\n\n";
    std::fs::write(&path, sql).unwrap();

    assert_eq!(load_query_from_file(&path).unwrap(), sql);
}

#[test]
fn test_missing_query_file_is_a_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = QueryFile::RankedCompanies.load(dir.path()).unwrap_err();

    assert_eq!(err.category(), "Query Error");
    assert!(err.to_string().contains("top_25_percent_data.sql"));
}

#[test]
fn test_shipped_query_files_are_read_only() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("queries");
    for backend in [WarehouseBackend::Snowflake, WarehouseBackend::Postgres] {
        let guard = ReadOnlyGuard::new(backend);
        for file in QueryFile::ALL {
            let statement = file.load(&dir).unwrap();
            assert!(
                guard.check(statement.sql()).is_ok(),
                "{} rejected for {}",
                file.file_name(),
                backend.as_str()
            );
        }
    }
}

#[tokio::test]
async fn test_writing_query_never_reaches_the_warehouse() {
    let mock = Arc::new(MockWarehouse::new());
    let mut runner = QueryRunner::new(mock.clone(), Duration::from_secs(600));

    let err = runner
        .run(&Statement::new("DELETE FROM holding"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Query Error");
    assert_eq!(mock.execution_count(), 0);
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let mock = Arc::new(MockWarehouse::new().with_error("from price", "warehouse suspended"));
    let mut runner = QueryRunner::new(mock.clone(), Duration::from_secs(600));
    let statement = Statement::new("SELECT close_usd FROM price");

    assert!(runner.run(&statement).await.is_err());
    assert!(runner.run(&statement).await.is_err());
    assert_eq!(mock.execution_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_is_keyed_by_parameters_and_expires() {
    let mock = Arc::new(MockWarehouse::new());
    let mut runner = QueryRunner::new(mock.clone(), Duration::from_secs(10));
    let sql = "SELECT close_usd FROM price WHERE ticker = ?";

    runner.run(&Statement::new(sql).bind("AAPL")).await.unwrap();
    runner.run(&Statement::new(sql).bind("AAPL")).await.unwrap();
    runner.run(&Statement::new(sql).bind("MSFT")).await.unwrap();
    assert_eq!(mock.execution_count(), 2);

    tokio::time::advance(Duration::from_secs(10)).await;
    runner.run(&Statement::new(sql).bind("AAPL")).await.unwrap();
    assert_eq!(mock.execution_count(), 3);
}
