//! Dashboard integration tests.
//!
//! Drives the dashboard sections against in-memory warehouses and checks the
//! statements that reach the warehouse.

use market_glance::dashboard::{Dashboard, NoticeLevel, Section};
use market_glance::query::{QueryFile, QueryRunner};
use market_glance::warehouse::{
    ColumnInfo, FailingWarehouse, MockWarehouse, Table, Value, Warehouse, WarehouseBackend,
};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn queries_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("queries")
}

fn dashboard_over(warehouse: Arc<dyn Warehouse>) -> Dashboard {
    Dashboard::new(
        Some(QueryRunner::new(warehouse, Duration::from_secs(600))),
        queries_dir(),
    )
}

fn ticker_table(tickers: &[&str]) -> Table {
    Table::with_data(
        vec![ColumnInfo::new("TICKER", "text")],
        tickers.iter().map(|t| vec![Value::from(*t)]).collect(),
    )
}

fn price_table(rows: &[(&str, f64)]) -> Table {
    Table::with_data(
        vec![
            ColumnInfo::new("DATE", "date"),
            ColumnInfo::new("TICKER", "text"),
            ColumnInfo::new("CLOSE_USD", "fixed"),
        ],
        rows.iter()
            .map(|(date, close)| {
                vec![
                    Value::String(date.to_string()),
                    Value::from("ABC"),
                    Value::Float(*close),
                ]
            })
            .collect(),
    )
}

#[tokio::test]
async fn test_selecting_a_ticker_issues_one_bound_statement() {
    let mock = Arc::new(
        MockWarehouse::new()
            .with_table("distinct ticker", ticker_table(&["AAA", "ABC"]))
            .with_table(
                "c.ticker =",
                price_table(&[("2024-01-02", 10.0), ("2024-01-03", 11.5)]),
            ),
    );
    let mut dash = dashboard_over(mock.clone());
    dash.load_tickers().await;
    assert_eq!(dash.selected.as_deref(), Some("AAA"));
    let before = mock.execution_count();

    assert!(dash.select_ticker("ABC").await);

    let executed = mock.executed();
    assert_eq!(executed.len(), before + 1);
    let statement = executed.last().unwrap();
    assert!(statement.sql().contains("c.ticker = ?"));
    assert!(!statement.sql().contains("ABC"));
    assert_eq!(statement.params(), &[Value::from("ABC")]);

    let series = dash.series.as_ref().unwrap();
    assert_eq!(series.ticker, "ABC");
    assert_eq!(series.points.len(), 2);
    assert_eq!(series.title(), "Daily Close Price for ABC");
}

#[tokio::test]
async fn test_postgres_backend_uses_numbered_placeholder() {
    let mock = Arc::new(
        MockWarehouse::new()
            .with_backend(WarehouseBackend::Postgres)
            .with_table("distinct ticker", ticker_table(&["ABC"])),
    );
    let mut dash = dashboard_over(mock.clone());
    dash.load_tickers().await;

    let statement = mock.executed().pop().unwrap();
    assert!(statement.sql().contains("c.ticker = $1"));
    assert_eq!(statement.params(), &[Value::from("ABC")]);
}

#[tokio::test]
async fn test_query_files_are_sent_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let sql = "-- custom sectors\nSELECT 'Energy' AS sector_name, 1.5 AS sector_position_usd\n";
    std::fs::write(QueryFile::TopSectors.path_in(dir.path()), sql).unwrap();

    let mock = Arc::new(MockWarehouse::new());
    let mut dash = Dashboard::new(
        Some(QueryRunner::new(mock.clone(), Duration::from_secs(600))),
        dir.path(),
    );
    dash.load_sectors().await;

    let executed = mock.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql(), sql);
    assert!(executed[0].params().is_empty());
}

#[tokio::test]
async fn test_failing_warehouse_reports_one_error_per_section() {
    let failing = Arc::new(FailingWarehouse::new());
    let mut dash = dashboard_over(failing.clone());
    dash.refresh_all().await;

    assert_eq!(failing.attempts(), 3);
    assert_eq!(dash.notices().len(), 3);
    for notice in dash.notices().all() {
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.message,
            "An error occurred while executing the query: Warehouse is unreachable"
        );
    }
    assert!(dash.sectors.is_none());
    assert!(dash.ranked.is_none());
    assert!(dash.tickers.is_empty());
}

#[tokio::test]
async fn test_failure_in_one_section_leaves_the_others_intact() {
    let mock = MockWarehouse::new()
        .with_error("sector_position_usd", "sector view missing")
        .with_table("distinct ticker", ticker_table(&["ABC"]))
        .with_table("c.ticker =", price_table(&[("2024-01-02", 10.0)]));
    let mut dash = dashboard_over(Arc::new(mock));
    dash.refresh_all().await;

    assert!(dash.sectors.is_none());
    assert_eq!(dash.notices().len(), 1);
    assert_eq!(dash.notices().for_section(Section::Sectors).count(), 1);
    assert!(dash.ranked.is_some());
    assert_eq!(dash.selected.as_deref(), Some("ABC"));
    assert_eq!(dash.series.as_ref().unwrap().points.len(), 1);
}

#[tokio::test]
async fn test_missing_columns_become_warnings() {
    let mock = MockWarehouse::new().with_table(
        "sector_position_usd",
        Table::with_data(
            vec![ColumnInfo::new("NAME", "text")],
            vec![vec![Value::from("Energy")]],
        ),
    );
    let mut dash = dashboard_over(Arc::new(mock));
    dash.load_sectors().await;

    let notice = dash.notices().for_section(Section::Sectors).next().unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert!(notice.message.contains("SECTOR_POSITION_USD"));
}

#[tokio::test]
async fn test_sector_bars_keep_warehouse_order_and_scale() {
    let mut dash = dashboard_over(Arc::new(MockWarehouse::demo()));
    dash.load_sectors().await;

    let bars = &dash.sectors.as_ref().unwrap().bars;
    assert_eq!(bars.len(), 10);
    assert!(bars.windows(2).all(|w| w[0].position >= w[1].position));
    assert_eq!(bars[0].fraction, 1.0);
    assert!(bars.iter().all(|b| b.label.starts_with('$')));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_inside_ttl_hits_the_cache() {
    let mock = Arc::new(MockWarehouse::demo());
    let mut dash = dashboard_over(mock.clone());

    dash.refresh_all().await;
    let first = mock.execution_count();
    assert_eq!(first, 4);

    tokio::time::advance(Duration::from_secs(599)).await;
    dash.refresh_all().await;
    assert_eq!(mock.execution_count(), first);

    tokio::time::advance(Duration::from_secs(2)).await;
    dash.refresh_all().await;
    assert_eq!(mock.execution_count(), first * 2);
}
