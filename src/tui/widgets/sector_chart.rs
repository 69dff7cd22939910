//! Horizontal bar chart of sector positions.

use crate::dashboard::{Notice, SectorChart};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::banner::Banner;

pub const TITLE: &str = "Top 10 Sectors by Position (USD)";
pub const SUBTITLE: &str = "From highest to lowest";
pub const FALLBACK: &str = "Refresh (F5) to get the data";

const MAX_NAME_WIDTH: usize = 24;
const BAR_CHAR: &str = "█";

/// Sector chart panel.
pub struct SectorChartPanel<'a> {
    chart: Option<&'a SectorChart>,
    notices: Vec<&'a Notice>,
    highlighted: Option<usize>,
    focused: bool,
}

impl<'a> SectorChartPanel<'a> {
    pub fn new(
        chart: Option<&'a SectorChart>,
        notices: impl IntoIterator<Item = &'a Notice>,
        highlighted: Option<usize>,
        focused: bool,
    ) -> Self {
        Self {
            chart: chart.filter(|c| !c.is_empty()),
            notices: notices.into_iter().collect(),
            highlighted,
            focused,
        }
    }

    /// Panel content for the given interior width.
    pub fn render_to_lines(&self, width: usize) -> Vec<Line<'a>> {
        let mut lines = Banner::new(self.notices.iter().copied()).lines();

        let Some(chart) = self.chart else {
            lines.push(Line::from(Span::styled(
                FALLBACK,
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        };

        lines.push(Line::from(Span::styled(
            SUBTITLE,
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));

        let name_width = chart
            .bars
            .iter()
            .map(|b| b.name.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_NAME_WIDTH);
        let label_width = chart
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0);
        // name, space, bar, space, label
        let bar_width = width.saturating_sub(name_width + label_width + 2);

        for (i, bar) in chart.bars.iter().enumerate() {
            let is_highlighted = self.highlighted == Some(i);
            let name_style = if is_highlighted {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let (r, g, b) = bar.color;
            let length = (bar.fraction * bar_width as f64).round() as usize;

            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<name_width$} ", truncate(&bar.name, name_width)),
                    name_style,
                ),
                Span::styled(BAR_CHAR.repeat(length), Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(" "),
                Span::raw(bar.label.clone()),
            ]));
        }

        if let Some(tooltip) = self.highlighted.and_then(|i| chart.tooltip(i)) {
            lines.push(Line::from(Span::styled(
                tooltip,
                Style::default().fg(Color::Cyan),
            )));
        }

        lines
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

impl Widget for SectorChartPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {TITLE} "));

        let lines = self.render_to_lines(block.inner(area).width as usize);
        Paragraph::new(lines).block(block).render(area, buf);
    }
}
