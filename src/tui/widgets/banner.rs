//! Notice banner widget for the TUI.
//!
//! Shows error and warning notices inside a bordered box. Used for the
//! connection notice above the dashboard and for each section's notices.

use crate::dashboard::{Notice, NoticeLevel};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// Notice banner widget.
pub struct Banner<'a> {
    notices: Vec<&'a Notice>,
}

impl<'a> Banner<'a> {
    pub fn new(notices: impl IntoIterator<Item = &'a Notice>) -> Self {
        Self {
            notices: notices.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Rows needed to show every notice at the given width, borders included.
    pub fn height(&self, width: u16) -> u16 {
        if self.notices.is_empty() {
            return 0;
        }
        let inner = width.saturating_sub(2).max(1) as usize;
        let lines: usize = self
            .notices
            .iter()
            .map(|n| (level_label(n.level).len() + n.message.chars().count()).div_ceil(inner))
            .sum();
        lines as u16 + 2
    }

    /// Lines for embedding the notices in another widget.
    pub fn lines(&self) -> Vec<Line<'a>> {
        self.notices
            .iter()
            .map(|n| {
                Line::from(vec![
                    Span::styled(
                        level_label(n.level),
                        level_style(n.level).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(n.message.as_str(), level_style(n.level)),
                ])
            })
            .collect()
    }
}

fn level_label(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Error => "Error: ",
        NoticeLevel::Warning => "Warning: ",
    }
}

fn level_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Error => Style::default().fg(Color::Red),
        NoticeLevel::Warning => Style::default().fg(Color::Yellow),
    }
}

impl Widget for Banner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.notices.is_empty() {
            return;
        }
        Clear.render(area, buf);

        let worst = if self.notices.iter().any(|n| n.level == NoticeLevel::Error) {
            NoticeLevel::Error
        } else {
            NoticeLevel::Warning
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(level_style(worst));

        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
