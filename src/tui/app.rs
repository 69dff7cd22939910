//! Application state for the TUI.
//!
//! Key handling is split in two: `handle_key` updates view state and decides
//! what the key asks for, `perform` carries out anything that needs the
//! warehouse. The loop awaits `perform` before reading the next key.

use crate::dashboard::Dashboard;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// Rows moved by PageUp/PageDown in the ranked table.
const PAGE_ROWS: isize = 10;

/// Which section currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Sectors,
    Ranked,
    Series,
}

impl Focus {
    /// Cycles to the next section.
    pub fn next(self) -> Self {
        match self {
            Self::Sectors => Self::Ranked,
            Self::Ranked => Self::Series,
            Self::Series => Self::Sectors,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Sectors => Self::Series,
            Self::Ranked => Self::Sectors,
            Self::Series => Self::Ranked,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sectors => "sectors",
            Self::Ranked => "ranked",
            Self::Series => "series",
        }
    }
}

/// Work a key press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    SelectTicker(String),
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    pub focus: Focus,
    pub dashboard: Dashboard,
    /// Connection name and backend, for the header.
    pub connection_label: String,
    /// Highlighted bar in the sector chart.
    pub sector_cursor: usize,
    /// Highlighted point in the price chart; `None` follows the latest point.
    pub series_cursor: Option<usize>,
    pub ranked_view: crate::dashboard::RankedView,
    /// Highlighted entry while the company dropdown is open.
    pub dropdown: Option<usize>,
}

impl App {
    pub fn new(dashboard: Dashboard, connection_label: impl Into<String>) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            dashboard,
            connection_label: connection_label.into(),
            sector_cursor: 0,
            series_cursor: None,
            ranked_view: Default::default(),
            dropdown: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.dashboard.is_connected()
    }

    /// Index of the highlighted sector bar, clamped to the chart.
    pub fn sector_index(&self) -> Option<usize> {
        let len = self.dashboard.sectors.as_ref()?.bars.len();
        (len > 0).then(|| self.sector_cursor.min(len - 1))
    }

    /// Index of the highlighted price point, clamped to the series.
    pub fn series_index(&self) -> Option<usize> {
        let len = self.dashboard.series.as_ref()?.points.len();
        (len > 0).then(|| self.series_cursor.unwrap_or(len - 1).min(len - 1))
    }

    /// Updates view state for a key and returns the work it asks for.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.dropdown.is_some() {
            return self.handle_dropdown_key(key);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Action::Quit,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('r') if ctrl => Action::Refresh,
            KeyCode::F(5) => Action::Refresh,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                Action::None
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                Action::None
            }
            _ => {
                match self.focus {
                    Focus::Sectors => self.handle_sectors_key(key.code),
                    Focus::Ranked => self.handle_ranked_key(key.code),
                    Focus::Series => self.handle_series_key(key.code),
                }
                Action::None
            }
        }
    }

    fn handle_sectors_key(&mut self, code: KeyCode) {
        let Some(current) = self.sector_index() else {
            return;
        };
        let last = self.dashboard.sectors.as_ref().map_or(0, |c| c.bars.len() - 1);
        self.sector_cursor = match code {
            KeyCode::Up => current.saturating_sub(1),
            KeyCode::Down => (current + 1).min(last),
            KeyCode::Home => 0,
            KeyCode::End => last,
            _ => current,
        };
    }

    fn handle_ranked_key(&mut self, code: KeyCode) {
        let Some(table) = self.dashboard.ranked.as_ref() else {
            return;
        };
        let rows = table.row_count();
        match code {
            KeyCode::Up => self.ranked_view.scroll_by(-1, rows, 1),
            KeyCode::Down => self.ranked_view.scroll_by(1, rows, 1),
            KeyCode::PageUp => self.ranked_view.scroll_by(-PAGE_ROWS, rows, 1),
            KeyCode::PageDown => self.ranked_view.scroll_by(PAGE_ROWS, rows, 1),
            KeyCode::Char('s') => self.ranked_view.cycle_sort_column(table.columns.len()),
            KeyCode::Char('r') => self.ranked_view.reverse(),
            _ => {}
        }
    }

    fn handle_series_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter if !self.dashboard.tickers.is_empty() => {
                let current = self
                    .dashboard
                    .selected
                    .as_ref()
                    .and_then(|s| self.dashboard.tickers.iter().position(|t| t == s))
                    .unwrap_or(0);
                self.dropdown = Some(current);
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Home | KeyCode::End => {
                let Some(current) = self.series_index() else {
                    return;
                };
                let last = self
                    .dashboard
                    .series
                    .as_ref()
                    .map_or(0, |s| s.points.len() - 1);
                self.series_cursor = Some(match code {
                    KeyCode::Left => current.saturating_sub(1),
                    KeyCode::Right => (current + 1).min(last),
                    KeyCode::Home => 0,
                    _ => last,
                });
            }
            _ => {}
        }
    }

    fn handle_dropdown_key(&mut self, key: KeyEvent) -> Action {
        let Some(current) = self.dropdown else {
            return Action::None;
        };
        let last = self.dashboard.tickers.len().saturating_sub(1);
        match key.code {
            KeyCode::Up => self.dropdown = Some(current.saturating_sub(1)),
            KeyCode::Down => self.dropdown = Some((current + 1).min(last)),
            KeyCode::Esc => self.dropdown = None,
            KeyCode::Enter => {
                self.dropdown = None;
                if let Some(ticker) = self.dashboard.tickers.get(current) {
                    return Action::SelectTicker(ticker.clone());
                }
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Action::Quit;
            }
            _ => {}
        }
        Action::None
    }

    /// Carries out an action. Warehouse work is awaited here.
    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.running = false,
            Action::Refresh => {
                self.dashboard.refresh_all().await;
                self.series_cursor = None;
                self.ranked_view.scroll = 0;
            }
            Action::SelectTicker(ticker) => {
                if self.dashboard.select_ticker(&ticker).await {
                    debug!("Selected {}", ticker);
                    self.series_cursor = None;
                }
            }
        }
    }
}
