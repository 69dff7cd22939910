//! Headless mode for scripted runs and tests.
//!
//! Runs the dashboard UI against an in-memory terminal, executing scripted
//! events and capturing the screen for verification.

mod events;
mod output;

pub use events::{parse_size, Assertion, Event, EventParser};
pub use output::{HeadlessOutput, OutputFormat, ScreenRenderer};

use crate::cli::Cli;
use crate::dashboard::Notice;
use crate::error::{DashError, Result};
use crate::tui::app::{Action, App};
use crate::tui::ui;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Screen width in columns.
    pub width: u16,
    /// Screen height in rows.
    pub height: u16,
    pub output_format: OutputFormat,
    /// Whether to stop on first assertion failure.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 120,
            height: 40,
            output_format: OutputFormat::Text,
            fail_fast: false,
            output_file: None,
        }
    }
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(DashError::config)?;
        let output_format = cli.parse_output_format().map_err(DashError::config)?;

        Ok(Self {
            width,
            height,
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    /// Screen lines for JSON output.
    pub screen_lines: Vec<String>,
    pub events_executed: usize,
    pub duration: Duration,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    /// Dashboard state after the last event.
    pub state: HeadlessState,
    /// Frame captures (for frames output mode).
    pub frames: Vec<Frame>,
}

/// Snapshot of application state for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessState {
    pub focus: String,
    pub running: bool,
    pub connected: bool,
    pub selected: Option<String>,
    pub ticker_count: usize,
    pub sector_bars: usize,
    pub ranked_rows: usize,
    pub series_points: usize,
    pub notices: Vec<Notice>,
    pub dropdown_open: bool,
}

impl HeadlessState {
    pub fn from_app(app: &App) -> Self {
        let dashboard = &app.dashboard;
        Self {
            focus: app.focus.as_str().to_string(),
            running: app.running,
            connected: app.is_connected(),
            selected: dashboard.selected.clone(),
            ticker_count: dashboard.tickers.len(),
            sector_bars: dashboard.sectors.as_ref().map_or(0, |c| c.bars.len()),
            ranked_rows: dashboard.ranked.as_ref().map_or(0, |t| t.row_count()),
            series_points: dashboard.series.as_ref().map_or(0, |s| s.points.len()),
            notices: dashboard.notices().all().to_vec(),
            dropdown_open: app.dropdown.is_some(),
        }
    }
}

/// A captured frame (screen state after an event).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame number (0 = initial state).
    pub number: usize,
    /// Event that produced this frame (None for initial).
    pub event: Option<String>,
    pub screen: String,
}

/// Runs the dashboard in headless mode.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    events: Vec<Event>,
    frames: Vec<Frame>,
    assertions_passed: usize,
    assertions_failed: usize,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig, app: App) -> Result<Self> {
        let backend = TestBackend::new(config.width, config.height);
        let terminal = Terminal::new(backend)
            .map_err(|e| DashError::internal(format!("Failed to create test terminal: {e}")))?;

        Ok(Self {
            config,
            terminal,
            app,
            events: Vec::new(),
            frames: Vec::new(),
            assertions_passed: 0,
            assertions_failed: 0,
        })
    }

    /// Loads events from a string (comma-separated or newline-separated).
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file, or stdin for `-`.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            std::io::read_to_string(std::io::stdin())
                .map_err(|e| DashError::internal(format!("Failed to read stdin: {e}")))?
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| DashError::config(format!("Failed to read script file {path}: {e}")))?
        };

        self.load_events(&content)
    }

    /// Loads the dashboard, runs every event, and returns the result.
    ///
    /// Frame 0 shows the dashboard after the initial load, which is what an
    /// interactive session shows once its first refresh completes.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        let start_time = Instant::now();

        self.app.perform(Action::Refresh).await;
        self.capture_frame(None)?;

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            let event_str = event.to_string();
            debug!("Headless event: {}", event_str);

            match &event {
                Event::Key(key) => {
                    let action = self.app.handle_key(*key);
                    self.app.perform(action).await;
                }
                Event::Select(ticker) => {
                    self.app
                        .perform(Action::SelectTicker(ticker.clone()))
                        .await;
                }
                Event::Wait(duration) => tokio::time::sleep(*duration).await,
                Event::Resize(w, h) => {
                    // Terminal::resize only adjusts the viewport, not the buffer
                    self.terminal.backend_mut().resize(*w, *h);
                    self.terminal
                        .resize(Rect::new(0, 0, *w, *h))
                        .map_err(|e| DashError::internal(format!("Resize failed: {e}")))?;
                }
                Event::Snapshot(_) => {}
                Event::Assert(assertion) => {
                    self.draw()?;
                    let screen = self.render_screen();
                    if assertion.check(&screen, &self.app) {
                        self.assertions_passed += 1;
                    } else {
                        warn!("Assertion failed: {}", event_str);
                        self.assertions_failed += 1;
                        if self.config.fail_fast {
                            events_executed += 1;
                            break;
                        }
                    }
                }
            }

            events_executed += 1;

            if self.config.output_format == OutputFormat::Frames {
                self.capture_frame(Some(event_str))?;
            }

            if !self.app.running {
                break;
            }
        }

        self.draw()?;
        let screen = self.render_screen();
        let screen_lines = screen.lines().map(String::from).collect();

        Ok(HeadlessResult {
            screen,
            screen_lines,
            events_executed,
            duration: start_time.elapsed(),
            assertions_passed: self.assertions_passed,
            assertions_failed: self.assertions_failed,
            state: HeadlessState::from_app(&self.app),
            frames: self.frames,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| DashError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    fn render_screen(&self) -> String {
        ScreenRenderer::render(self.terminal.backend().buffer())
    }

    fn capture_frame(&mut self, event: Option<String>) -> Result<()> {
        self.draw()?;
        let screen = self.render_screen();
        let number = self.frames.len();
        self.frames.push(Frame {
            number,
            event,
            screen,
        });
        Ok(())
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(cli: &Cli, app: App) -> Result<i32> {
    cli.validate_headless().map_err(DashError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), app)?;

    if let Some(ref events) = cli.events {
        runner.load_events(events)?;
    } else if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    }

    let result = runner.run().await?;
    info!(
        "Headless run finished: {} events, {} assertions failed",
        result.events_executed, result.assertions_failed
    );

    let output = HeadlessOutput::new(config.output_format).format(&result);
    match config.output_file {
        Some(ref path) => std::fs::write(path, &output)
            .map_err(|e| DashError::internal(format!("Failed to write output file: {e}")))?,
        None => print!("{output}"),
    }

    Ok(if result.assertions_failed > 0 { 1 } else { 0 })
}
