//! Event DSL parser for headless mode.
//!
//! Parses event strings like "key:f5", "select:MSFT", "wait:100ms" into
//! executable events.

use crate::error::{DashError, Result};
use crate::tui::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::time::Duration;

/// An assertion to check against the screen or state.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen contains text (case-sensitive).
    ContainsExact(String),
    /// Screen does not contain text.
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// State field equals value.
    StateEquals { field: String, value: String },
    /// State field comparison (>=, <=, >, <).
    StateCompare {
        field: String,
        op: String,
        value: String,
    },
}

impl Assertion {
    /// Checks the assertion against the screen and app state.
    pub fn check(&self, screen: &str, app: &App) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::ContainsExact(text) => screen.contains(text),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::StateEquals { field, value } => {
                let actual = get_state_field(app, field);
                actual.as_deref() == Some(value.as_str())
            }
            Self::StateCompare { field, op, value } => {
                let actual = get_state_field(app, field);
                compare_values(actual.as_deref(), op, value)
            }
        }
    }
}

/// Gets a state field value from the app.
fn get_state_field(app: &App, field: &str) -> Option<String> {
    let dashboard = &app.dashboard;
    match field {
        "focus" => Some(app.focus.as_str().to_string()),
        "running" => Some(app.running.to_string()),
        "connected" => Some(app.is_connected().to_string()),
        "selected" => Some(dashboard.selected.clone().unwrap_or_default()),
        "ticker_count" => Some(dashboard.tickers.len().to_string()),
        "sector_bars" => Some(
            dashboard
                .sectors
                .as_ref()
                .map_or(0, |c| c.bars.len())
                .to_string(),
        ),
        "ranked_rows" => Some(
            dashboard
                .ranked
                .as_ref()
                .map_or(0, |t| t.row_count())
                .to_string(),
        ),
        "series_points" => Some(
            dashboard
                .series
                .as_ref()
                .map_or(0, |s| s.points.len())
                .to_string(),
        ),
        "notice_count" => Some(dashboard.notices().len().to_string()),
        "dropdown_open" => Some(app.dropdown.is_some().to_string()),
        _ => None,
    }
}

/// Compares values using the given operator.
fn compare_values(actual: Option<&str>, op: &str, expected: &str) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    // Try numeric comparison first
    if let (Ok(a), Ok(e)) = (actual.parse::<i64>(), expected.parse::<i64>()) {
        return match op {
            ">=" => a >= e,
            "<=" => a <= e,
            ">" => a > e,
            "<" => a < e,
            "=" | "==" => a == e,
            _ => false,
        };
    }

    match op {
        "=" | "==" => actual == expected,
        _ => false,
    }
}

/// A parsed event that can be executed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// Pick a company in the selector, as if chosen from the dropdown.
    Select(String),
    /// Wait for a duration.
    Wait(Duration),
    /// Resize the terminal.
    Resize(u16, u16),
    /// Take a named snapshot.
    Snapshot(String),
    /// Assert something about the screen or state.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                let mut parts = Vec::new();
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    parts.push("ctrl".to_string());
                }
                if key.modifiers.contains(KeyModifiers::ALT) {
                    parts.push("alt".to_string());
                }
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    parts.push("shift".to_string());
                }
                parts.push(key_code_to_string(&key.code));
                write!(f, "key:{}", parts.join("+"))
            }
            Self::Select(ticker) => write!(f, "select:{ticker}"),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{w}x{h}"),
            Self::Snapshot(name) => write!(f, "snapshot:{name}"),
            Self::Assert(a) => match a {
                Assertion::Contains(t) => write!(f, "assert:contains:{t}"),
                Assertion::ContainsExact(t) => write!(f, "assert:contains-exact:{t}"),
                Assertion::NotContains(t) => write!(f, "assert:not-contains:{t}"),
                Assertion::Matches(p) => write!(f, "assert:matches:{p}"),
                Assertion::StateEquals { field, value } => {
                    write!(f, "assert:state:{field}={value}")
                }
                Assertion::StateCompare { field, op, value } => {
                    write!(f, "assert:state:{field}{op}{value}")
                }
            },
        }
    }
}

fn key_code_to_string(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => "unknown".to_string(),
    }
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses all events from an input string.
    /// Supports comma-separated and newline-separated events.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        for line in input.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            for part in line.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                events.push(self.parse_one(part)?);
            }
        }

        Ok(events)
    }

    /// Parses a single event string.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();

        let Some((event_type, value)) = input.split_once(':') else {
            return Err(DashError::config(format!(
                "Invalid event syntax: '{input}'. Expected format: type:value"
            )));
        };
        let (event_type, value) = (event_type.trim().to_lowercase(), value.trim());

        match event_type.as_str() {
            "key" => self.parse_key(value),
            "select" if !value.is_empty() => Ok(Event::Select(value.to_string())),
            "select" => Err(DashError::config("select needs a ticker")),
            "wait" => self.parse_wait(value),
            "resize" => self.parse_resize(value),
            "snapshot" => Ok(Event::Snapshot(value.to_string())),
            "assert" => self.parse_assert(value),
            _ => Err(DashError::config(format!(
                "Unknown event type: '{event_type}'. Valid types: key, select, wait, resize, snapshot, assert"
            ))),
        }
    }

    /// Parses a key event like "enter", "ctrl+r", "shift+tab".
    fn parse_key(&self, value: &str) -> Result<Event> {
        let parts: Vec<&str> = value.split('+').collect();
        let (key_str, modifier_parts) = match parts.split_last() {
            Some((key, mods)) => (*key, mods),
            None => ("", &[][..]),
        };

        let mut modifiers = KeyModifiers::empty();
        for part in modifier_parts {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    return Err(DashError::config(format!(
                        "Unknown modifier: '{part}'. Valid modifiers: ctrl, alt, shift"
                    )));
                }
            }
        }

        let mut code = self.parse_key_code(key_str)?;
        // terminals report shift+tab as BackTab
        if code == KeyCode::Tab && modifiers.contains(KeyModifiers::SHIFT) {
            code = KeyCode::BackTab;
        }

        Ok(Event::Key(KeyEvent::new(code, modifiers)))
    }

    /// Parses a key code string into a KeyCode.
    fn parse_key_code(&self, s: &str) -> Result<KeyCode> {
        let s_lower = s.to_lowercase();

        if let Some(n) = s_lower
            .strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
        {
            return Ok(KeyCode::F(n));
        }

        let code = match s_lower.as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        return Err(DashError::config(format!(
                            "Unknown key: '{s}'. Use single characters or named keys like enter, esc, tab, f5."
                        )));
                    }
                }
            }
        };

        Ok(code)
    }

    /// Parses a wait duration like "100ms", "2s", or just "100" (defaults to ms).
    fn parse_wait(&self, value: &str) -> Result<Event> {
        let value = value.trim().to_lowercase();
        let invalid = || DashError::config(format!("Invalid duration: '{value}'"));

        let duration = if let Some(ms) = value.strip_suffix("ms") {
            Duration::from_millis(ms.parse().map_err(|_| invalid())?)
        } else if let Some(secs) = value.strip_suffix('s') {
            Duration::from_secs(secs.parse().map_err(|_| invalid())?)
        } else {
            Duration::from_millis(value.parse().map_err(|_| invalid())?)
        };

        Ok(Event::Wait(duration))
    }

    /// Parses a resize event like "120x40".
    fn parse_resize(&self, value: &str) -> Result<Event> {
        let (width, height) = parse_size(value).map_err(DashError::config)?;
        Ok(Event::Resize(width, height))
    }

    /// Parses an assertion like "contains:hello" or "state:focus=series".
    fn parse_assert(&self, value: &str) -> Result<Event> {
        let Some((assert_type, rest)) = value.split_once(':') else {
            return Err(DashError::config(format!(
                "Invalid assertion syntax: '{value}'. Expected assert:type:value"
            )));
        };
        let (assert_type, rest) = (assert_type.trim().to_lowercase(), rest.trim());

        let assertion = match assert_type.as_str() {
            "contains" => Assertion::Contains(rest.to_string()),
            "contains-exact" => Assertion::ContainsExact(rest.to_string()),
            "not-contains" => Assertion::NotContains(rest.to_string()),
            "matches" => Assertion::Matches(rest.to_string()),
            "state" => self.parse_state_assertion(rest)?,
            _ => {
                return Err(DashError::config(format!(
                    "Unknown assertion type: '{assert_type}'. Valid types: contains, contains-exact, not-contains, matches, state"
                )));
            }
        };

        Ok(Event::Assert(assertion))
    }

    /// Parses a state assertion like "selected=AAPL" or "sector_bars>=1".
    fn parse_state_assertion(&self, value: &str) -> Result<Assertion> {
        for op in [">=", "<=", ">", "<", "="] {
            if let Some(pos) = value.find(op) {
                let field = value[..pos].trim().to_string();
                let val = value[pos + op.len()..].trim().to_string();

                return Ok(if op == "=" {
                    Assertion::StateEquals { field, value: val }
                } else {
                    Assertion::StateCompare {
                        field,
                        op: op.to_string(),
                        value: val,
                    }
                });
            }
        }

        Err(DashError::config(format!(
            "Invalid state assertion: '{value}'. Expected field=value or field>=value"
        )))
    }
}

/// Parses `WIDTHxHEIGHT`.
pub fn parse_size(value: &str) -> std::result::Result<(u16, u16), String> {
    let Some((w, h)) = value.trim().split_once('x') else {
        return Err(format!(
            "Invalid size format: '{value}'. Expected WIDTHxHEIGHT (e.g., 120x40)"
        ));
    };
    let width = w
        .parse::<u16>()
        .map_err(|_| format!("Invalid width: '{w}'"))?;
    let height = h
        .parse::<u16>()
        .map_err(|_| format!("Invalid height: '{h}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("Screen size must be non-zero: '{value}'"));
    }
    Ok((width, height))
}
