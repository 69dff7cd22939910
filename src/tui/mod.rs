//! Terminal user interface for market-glance.
//!
//! Provides the main TUI loop using ratatui and crossterm, and the headless
//! runner that drives the same `App` against an in-memory terminal.

pub mod app;
mod events;
pub mod headless;
mod ui;
pub mod widgets;

pub use app::{Action, App, Focus};
pub use events::{Event, EventHandler};
pub use ui::render;

use crate::error::{DashError, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{debug, info};

/// The interactive terminal session.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| DashError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .map_err(|e| DashError::internal(format!("Failed to enter alternate screen: {e}")))?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| DashError::internal(format!("Failed to create terminal: {e}")))
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| DashError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .map_err(|e| DashError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| DashError::internal(format!("Failed to show cursor: {e}")))
    }

    /// Runs the event loop until the user quits.
    ///
    /// The first frame shows the empty dashboard, then all sections load.
    pub async fn run(&mut self, app: &mut App) -> Result<()> {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        self.draw(app)?;
        app.perform(Action::Refresh).await;

        let result = self.run_event_loop(app).await;

        let _ = panic::take_hook();
        result
    }

    async fn run_event_loop(&mut self, app: &mut App) -> Result<()> {
        while app.running {
            self.draw(app)?;

            let handler = self.event_handler;
            let event = tokio::task::spawn_blocking(move || handler.next())
                .await
                .map_err(|e| DashError::internal(format!("Event task failed: {e}")))??;

            match event {
                Event::Key(key) => {
                    let action = app.handle_key(key);
                    if action != Action::None {
                        debug!("Action: {:?}", action);
                    }
                    app.perform(action).await;
                }
                // ratatui picks up the new size on the next draw
                Event::Resize(_, _) | Event::Tick => {}
            }
        }
        Ok(())
    }

    fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| DashError::internal(format!("Failed to draw: {e}")))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive dashboard.
pub async fn run(app: &mut App) -> Result<()> {
    info!("Starting TUI");
    let mut tui = Tui::new()?;
    tui.run(app).await
}
