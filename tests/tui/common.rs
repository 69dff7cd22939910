//! Shared helpers for TUI tests.

use market_glance::dashboard::Dashboard;
use market_glance::query::QueryRunner;
use market_glance::tui::headless::{HeadlessConfig, HeadlessResult, HeadlessRunner};
use market_glance::tui::App;
use market_glance::warehouse::{FailingWarehouse, MockWarehouse, Warehouse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub fn queries_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("queries")
}

/// An app connected to the given warehouse, before its first refresh.
pub fn app_over(warehouse: Arc<dyn Warehouse>) -> App {
    let runner = QueryRunner::new(warehouse, Duration::from_secs(600));
    App::new(Dashboard::new(Some(runner), queries_dir()), "mock (snowflake)")
}

pub fn demo_app() -> App {
    app_over(Arc::new(MockWarehouse::demo()))
}

pub fn failing_app() -> App {
    app_over(Arc::new(FailingWarehouse::new()))
}

/// Runs `events` against `app` on a default-sized screen.
pub async fn run_events(app: App, events: &str) -> HeadlessResult {
    run_events_with(HeadlessConfig::default(), app, events).await
}

pub async fn run_events_with(config: HeadlessConfig, app: App, events: &str) -> HeadlessResult {
    let mut runner = HeadlessRunner::new(config, app).unwrap();
    runner.load_events(events).unwrap();
    runner.run().await.unwrap()
}
