//! Output formatting for headless mode.
//!
//! Provides different output formats: text, JSON, and frames.

use super::{HeadlessResult, HeadlessState};
use ratatui::buffer::Buffer;
use serde::Serialize;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text output of the final screen.
    #[default]
    Text,
    /// JSON output with screen, state, and metadata.
    Json,
    /// Frame-by-frame output showing the screen after each event.
    Frames,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "frames" => Ok(Self::Frames),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text, json, or frames"
            )),
        }
    }
}

/// Renders a ratatui buffer to a string.
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Renders a buffer to plain text, dropping trailing spaces and blank
    /// bottom lines.
    pub fn render(buffer: &Buffer) -> String {
        let area = buffer.area;
        if area.height == 0 {
            return String::new();
        }

        let mut lines: Vec<String> = (area.y..area.bottom())
            .map(|y| {
                let line: String = (area.x..area.right())
                    .map(|x| buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()))
                    .collect();
                line.trim_end_matches(' ').to_string()
            })
            .collect();

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        if lines.is_empty() {
            lines.push(String::new());
        }

        format!("{}\n", lines.join("\n"))
    }
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    screen: &'a str,
    screen_lines: &'a [String],
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary,
    state: &'a HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary {
    passed: usize,
    failed: usize,
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => Self::format_text(result),
            OutputFormat::Json => Self::format_json(result),
            OutputFormat::Frames => Self::format_frames(result),
        }
    }

    fn assertion_summary(result: &HeadlessResult) -> Option<String> {
        (result.assertions_passed > 0 || result.assertions_failed > 0).then(|| {
            format!(
                "Assertions: {} passed, {} failed",
                result.assertions_passed, result.assertions_failed
            )
        })
    }

    fn format_text(result: &HeadlessResult) -> String {
        let assertions = Self::assertion_summary(result)
            .map(|s| format!(" | {s}"))
            .unwrap_or_default();

        format!(
            "{}\nEvents: {} executed in {}ms{}\n",
            result.screen,
            result.events_executed,
            result.duration.as_millis(),
            assertions
        )
    }

    fn format_json(result: &HeadlessResult) -> String {
        let json_output = JsonOutput {
            screen: &result.screen,
            screen_lines: &result.screen_lines,
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary {
                passed: result.assertions_passed,
                failed: result.assertions_failed,
            },
            state: &result.state,
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {e}\"}}"))
    }

    fn format_frames(result: &HeadlessResult) -> String {
        let frames_text: String = result
            .frames
            .iter()
            .map(|frame| {
                let event_desc = frame.event.as_deref().unwrap_or("initial");
                format!(
                    "=== FRAME {} ({}) ===\n{}\n\n",
                    frame.number, event_desc, frame.screen
                )
            })
            .collect();

        let assertions = Self::assertion_summary(result)
            .map(|s| format!("{s}\n"))
            .unwrap_or_default();

        format!(
            "{}Total: {} frames, {} events executed in {}ms\n{}",
            frames_text,
            result.frames.len(),
            result.events_executed,
            result.duration.as_millis(),
            assertions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::headless::Frame;
    use ratatui::layout::Rect;
    use std::time::Duration;

    fn make_test_result() -> HeadlessResult {
        HeadlessResult {
            screen: "Test screen\nLine 2".to_string(),
            screen_lines: vec!["Test screen".to_string(), "Line 2".to_string()],
            events_executed: 3,
            duration: Duration::from_millis(150),
            assertions_passed: 2,
            assertions_failed: 0,
            state: HeadlessState {
                focus: "series".to_string(),
                running: true,
                connected: true,
                selected: Some("NVDA".to_string()),
                ticker_count: 5,
                sector_bars: 10,
                ranked_rows: 5,
                series_points: 30,
                notices: Vec::new(),
                dropdown_open: false,
            },
            frames: vec![
                Frame {
                    number: 0,
                    event: None,
                    screen: "Initial".to_string(),
                },
                Frame {
                    number: 1,
                    event: Some("select:NVDA".to_string()),
                    screen: "After selecting".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_text_output() {
        let text = HeadlessOutput::new(OutputFormat::Text).format(&make_test_result());

        assert!(text.contains("Test screen"));
        assert!(text.contains("Events: 3 executed"));
        assert!(text.contains("Assertions: 2 passed, 0 failed"));
    }

    #[test]
    fn test_json_output() {
        let json = HeadlessOutput::new(OutputFormat::Json).format(&make_test_result());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["events_executed"], 3);
        assert_eq!(parsed["state"]["selected"], "NVDA");
        assert_eq!(parsed["state"]["series_points"], 30);
        assert_eq!(parsed["assertions"]["passed"], 2);
    }

    #[test]
    fn test_frames_output() {
        let frames = HeadlessOutput::new(OutputFormat::Frames).format(&make_test_result());

        assert!(frames.contains("=== FRAME 0 (initial) ==="));
        assert!(frames.contains("=== FRAME 1 (select:NVDA) ==="));
        assert!(frames.contains("Total: 2 frames"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_screen_renderer_trims() {
        let mut buffer = Buffer::empty(Rect::new(0, 0, 10, 4));
        buffer.set_string(0, 0, "hi", ratatui::style::Style::default());
        buffer.set_string(2, 1, "there", ratatui::style::Style::default());

        assert_eq!(ScreenRenderer::render(&buffer), "hi\n  there\n");
    }
}
