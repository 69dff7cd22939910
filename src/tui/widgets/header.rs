//! Header widget for the TUI.
//!
//! Displays the dashboard title, version, and warehouse connection info.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub const TITLE: &str = "Financial Market Analysis Dashboard";

/// Header bar widget.
pub struct Header<'a> {
    connection_label: &'a str,
    is_connected: bool,
}

impl<'a> Header<'a> {
    pub fn new(connection_label: &'a str, is_connected: bool) -> Self {
        Self {
            connection_label,
            is_connected,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let title = Span::styled(format!(" {TITLE}"), style);
        let version = Span::styled(
            format!("  market-glance v{}", env!("CARGO_PKG_VERSION")),
            Style::default().bg(Color::Blue).fg(Color::Gray),
        );
        buf.set_line(area.x, area.y, &Line::from(vec![title, version]), area.width);

        let status_dot = if self.is_connected { "●" } else { "○" };
        let status_color = if self.is_connected {
            Color::Green
        } else {
            Color::Gray
        };
        let status_style = Style::default().bg(Color::Blue).fg(status_color);

        let info_text = format!(" [{}] ", self.connection_label);
        let right_width = (info_text.chars().count() + 2) as u16;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, status_dot, status_style);
            buf.set_string(right_x + 2, area.y, &info_text, style);
        }
    }
}
