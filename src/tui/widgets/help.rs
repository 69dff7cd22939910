//! Key hint footer for the TUI.
//!
//! Shows the shortcuts that apply to the focused section.

use crate::tui::app::Focus;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Footer line with keyboard shortcuts.
pub struct KeyHints {
    focus: Focus,
    dropdown_open: bool,
}

impl KeyHints {
    pub fn new(focus: Focus, dropdown_open: bool) -> Self {
        Self {
            focus,
            dropdown_open,
        }
    }

    fn shortcuts(&self) -> Vec<(&'static str, &'static str)> {
        if self.dropdown_open {
            return vec![("↑/↓", "move"), ("Enter", "select"), ("Esc", "close")];
        }

        let mut keys = match self.focus {
            Focus::Sectors => vec![("↑/↓", "highlight sector")],
            Focus::Ranked => vec![("↑/↓/PgUp/PgDn", "scroll"), ("s", "sort"), ("r", "reverse")],
            Focus::Series => vec![("←/→", "inspect point"), ("Enter", "change company")],
        };
        keys.extend([("Tab", "next section"), ("F5", "refresh"), ("q", "quit")]);
        keys
    }

    pub fn line(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(Color::Gray);

        let spans = self
            .shortcuts()
            .into_iter()
            .flat_map(|(key, desc)| {
                [
                    Span::styled(format!(" {key}"), key_style),
                    Span::styled(format!(" {desc} "), desc_style),
                ]
            })
            .collect::<Vec<_>>();
        Line::from(spans)
    }
}

impl Widget for KeyHints {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line()).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(hints: KeyHints) -> String {
        hints.line().spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_hints_follow_focus() {
        assert!(text(KeyHints::new(Focus::Ranked, false)).contains(" s sort "));
        assert!(text(KeyHints::new(Focus::Series, false)).contains(" Enter change company "));
        assert!(text(KeyHints::new(Focus::Sectors, false)).contains(" F5 refresh "));
    }

    #[test]
    fn test_dropdown_hints() {
        let hints = text(KeyHints::new(Focus::Series, true));
        assert!(hints.contains(" Esc close "));
        assert!(!hints.contains("quit"));
    }
}
