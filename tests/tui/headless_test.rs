//! Headless dashboard tests.
//!
//! Each test scripts key presses and selections against an in-memory
//! warehouse and checks the rendered screen and the resulting state.

use super::common::{demo_app, failing_app, run_events, run_events_with};
use market_glance::dashboard::{Dashboard, Section};
use market_glance::error::DashError;
use market_glance::tui::headless::{HeadlessConfig, OutputFormat};
use market_glance::tui::App;

#[tokio::test]
async fn test_initial_screen_shows_every_section() {
    let result = run_events(demo_app(), "assert:state:running=true").await;

    assert_eq!(result.assertions_failed, 0);
    assert!(result.screen.contains("Financial Market Analysis Dashboard"));
    assert!(result.screen.contains("Top 10 Sectors by Position (USD)"));
    assert!(result.screen.contains("From highest to lowest"));
    assert!(result.screen.contains("Top 25% Companies latest data"));
    assert!(result.screen.contains("Daily Close Price for AAPL"));
    assert!(result.screen.contains("Company: [AAPL"));

    assert_eq!(result.state.sector_bars, 10);
    assert_eq!(result.state.ranked_rows, 5);
    assert_eq!(result.state.ticker_count, 5);
    assert_eq!(result.state.series_points, 30);
    assert!(result.state.notices.is_empty());
}

#[tokio::test]
async fn test_select_event_switches_the_price_chart() {
    let result = run_events(
        demo_app(),
        "select:NVDA,assert:contains:Daily Close Price for NVDA,assert:state:selected=NVDA",
    )
    .await;

    assert_eq!(result.assertions_passed, 2);
    assert_eq!(result.assertions_failed, 0);
    assert_eq!(result.state.selected.as_deref(), Some("NVDA"));
    assert!(!result.screen.contains("Daily Close Price for AAPL"));
}

#[tokio::test]
async fn test_dropdown_selection_with_keys() {
    // AAPL, JPM, MSFT, NVDA, XOM: two steps down from AAPL is MSFT
    let result = run_events(
        demo_app(),
        "key:tab,key:tab,assert:state:focus=series,\
         key:enter,assert:state:dropdown_open=true,\
         key:down,key:down,key:enter,\
         assert:state:dropdown_open=false,assert:state:selected=MSFT",
    )
    .await;

    assert_eq!(result.assertions_failed, 0, "{}", result.screen);
    assert!(result.screen.contains("Daily Close Price for MSFT"));
}

#[tokio::test]
async fn test_escape_closes_dropdown_without_selecting() {
    let result = run_events(
        demo_app(),
        "key:backtab,key:enter,key:down,key:esc,\
         assert:state:dropdown_open=false,assert:state:selected=AAPL",
    )
    .await;

    assert_eq!(result.assertions_failed, 0);
}

#[tokio::test]
async fn test_unknown_ticker_selection_is_ignored() {
    let result = run_events(demo_app(), "select:NOPE,assert:state:selected=AAPL").await;

    assert_eq!(result.assertions_failed, 0);
    assert_eq!(result.state.series_points, 30);
}

#[tokio::test]
async fn test_failing_warehouse_shows_errors_and_fallbacks() {
    let result = run_events(
        failing_app(),
        "assert:contains:Refresh (F5) to get the data,\
         assert:contains:No companies available to select.,\
         assert:state:notice_count=3",
    )
    .await;

    assert_eq!(result.assertions_failed, 0, "{}", result.screen);
    assert!(result
        .screen
        .contains("An error occurred while executing the query"));
    assert!(result.state.connected);
    assert_eq!(result.state.selected, None);
}

#[tokio::test]
async fn test_connection_error_is_shown_once() {
    let mut dashboard = Dashboard::new(None, super::common::queries_dir());
    dashboard.report_connection_error(&DashError::connection("login failed"));
    let app = App::new(dashboard, "not connected");

    let result = run_events(app, "key:f5,assert:state:connected=false").await;

    assert_eq!(result.assertions_failed, 0);
    assert_eq!(result.state.notices.len(), 1);
    assert_eq!(result.state.notices[0].section, Section::Connection);
    assert!(result
        .screen
        .contains("An error occurred while connecting to the warehouse"));
    assert!(result.screen.contains("Refresh (F5) to get the data"));
}

#[tokio::test]
async fn test_failed_assertion_is_counted() {
    let result = run_events(
        demo_app(),
        "assert:contains:Daily Close Price for XOM,assert:state:sector_bars>=1",
    )
    .await;

    assert_eq!(result.assertions_passed, 1);
    assert_eq!(result.assertions_failed, 1);
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let config = HeadlessConfig {
        fail_fast: true,
        ..HeadlessConfig::default()
    };
    let result = run_events_with(
        config,
        demo_app(),
        "assert:state:selected=XOM,select:NVDA,assert:state:selected=NVDA",
    )
    .await;

    assert_eq!(result.assertions_failed, 1);
    assert_eq!(result.assertions_passed, 0);
    assert_eq!(result.events_executed, 1);
    assert_eq!(result.state.selected.as_deref(), Some("AAPL"));
}

#[tokio::test]
async fn test_quit_stops_processing_events() {
    let result = run_events(demo_app(), "key:q,select:NVDA").await;

    assert!(!result.state.running);
    assert_eq!(result.events_executed, 1);
    assert_eq!(result.state.selected.as_deref(), Some("AAPL"));
}

#[tokio::test]
async fn test_frames_capture_each_event() {
    let config = HeadlessConfig {
        output_format: OutputFormat::Frames,
        ..HeadlessConfig::default()
    };
    let result = run_events_with(config, demo_app(), "key:tab,select:JPM").await;

    assert_eq!(result.frames.len(), 3);
    assert_eq!(result.frames[0].event, None);
    assert!(result.frames[0].screen.contains("Daily Close Price for AAPL"));
    assert_eq!(result.frames[2].event.as_deref(), Some("select:JPM"));
    assert!(result.frames[2].screen.contains("Daily Close Price for JPM"));
}

#[tokio::test]
async fn test_small_screen_still_renders() {
    let config = HeadlessConfig {
        width: 60,
        height: 20,
        ..HeadlessConfig::default()
    };
    let result = run_events_with(
        config,
        demo_app(),
        "resize:40x12,assert:state:running=true",
    )
    .await;

    assert_eq!(result.assertions_failed, 0);
    assert!(result.screen_lines.len() <= 12);
    assert!(result.screen_lines.iter().all(|l| l.chars().count() <= 40));
}

#[tokio::test]
async fn test_resize_changes_the_captured_screen() {
    let result = run_events(demo_app(), "resize:150x45,assert:state:running=true").await;

    assert_eq!(result.assertions_failed, 0);
    assert!(result.screen_lines.len() > 40, "{}", result.screen_lines.len());
    assert!(result.screen_lines.iter().any(|l| l.chars().count() > 120));
}
