//! Ranked company table widget for the TUI.
//!
//! Renders the top-quartile result as a bordered grid with auto-sized
//! columns. Sorting and scrolling come from `RankedView`.

use crate::dashboard::{Notice, RankedView};
use crate::warehouse::{Table, Value};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::banner::Banner;

pub const TITLE: &str = "Top 25% Companies latest data";
pub const EMPTY_MESSAGE: &str = "No data available.";

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Lines around the data rows: top border, header, separator, bottom border, footer.
const CHROME_LINES: usize = 5;

/// Widget for the ranked table panel.
pub struct RankedTable<'a> {
    table: Option<&'a Table>,
    view: RankedView,
    notices: Vec<&'a Notice>,
    focused: bool,
}

impl<'a> RankedTable<'a> {
    pub fn new(
        table: Option<&'a Table>,
        view: RankedView,
        notices: impl IntoIterator<Item = &'a Notice>,
        focused: bool,
    ) -> Self {
        Self {
            table: table.filter(|t| !t.columns.is_empty() && !t.is_empty()),
            view,
            notices: notices.into_iter().collect(),
            focused,
        }
    }

    fn calculate_column_widths(table: &Table) -> Vec<usize> {
        let mut widths: Vec<usize> = table
            .columns
            .iter()
            .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH) + 1)
            .collect();

        for row in &table.rows {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }

        widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Truncates a string to fit within the given width, adding ellipsis if needed.
    fn truncate(s: &str, max_width: usize) -> String {
        if s.chars().count() <= max_width {
            s.to_string()
        } else if max_width <= 3 {
            s.chars().take(max_width).collect()
        } else {
            let kept: String = s.chars().take(max_width - 3).collect();
            format!("{kept}...")
        }
    }

    /// Renders the panel content, showing at most `max_rows` data rows.
    pub fn render_to_lines(&self, available_width: usize, max_rows: usize) -> Vec<Line<'a>> {
        let mut lines = Banner::new(self.notices.iter().copied()).lines();

        let Some(table) = self.table else {
            lines.push(Line::from(Span::styled(
                EMPTY_MESSAGE,
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        };

        let widths = Self::calculate_column_widths(table);

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() * 3 + 1;
        let scale_factor = if total_width > available_width && available_width > 0 {
            available_width as f64 / total_width as f64
        } else {
            1.0
        };
        let widths: Vec<usize> = widths
            .iter()
            .map(|&w| ((w as f64 * scale_factor) as usize).max(MIN_COLUMN_WIDTH))
            .collect();

        lines.push(border(&widths, '┌', '┬', '┐'));
        lines.push(self.render_header_row(table, &widths));
        lines.push(border(&widths, '├', '┼', '┤'));

        let rows = self.view.rows(table);
        let visible = rows.iter().skip(self.view.scroll).take(max_rows.max(1));
        for row in visible {
            lines.push(render_data_row(row, &widths));
        }

        lines.push(border(&widths, '└', '┴', '┘'));

        let shown_to = (self.view.scroll + max_rows.max(1)).min(rows.len());
        let footer = format!(
            "rows {}-{} of {} ({}ms)",
            (self.view.scroll + 1).min(rows.len()),
            shown_to,
            rows.len(),
            table.execution_time.as_millis()
        );
        lines.push(Line::from(Span::styled(
            footer,
            Style::default().fg(Color::DarkGray),
        )));

        lines
    }

    fn render_header_row(&self, table: &Table, widths: &[usize]) -> Line<'a> {
        let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

        for (i, col) in table.columns.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
            let marker = match self.view.sort_column {
                Some(c) if c == i && self.view.descending => "▼",
                Some(c) if c == i => "▲",
                _ => "",
            };
            let name = Self::truncate(&format!("{}{}", col.name, marker), width);
            spans.push(Span::styled(
                format!(" {name:width$} "),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }

        Line::from(spans)
    }
}

fn border<'a>(widths: &[usize], left: char, mid: char, right: char) -> Line<'a> {
    let inner: Vec<String> = widths.iter().map(|&w| "─".repeat(w + 2)).collect();
    let line = format!("{left}{}{right}", inner.join(&mid.to_string()));
    Line::from(Span::styled(line, Style::default().fg(Color::DarkGray)))
}

fn render_data_row<'a>(row: &[Value], widths: &[usize]) -> Line<'a> {
    let mut spans = vec![Span::styled("│", Style::default().fg(Color::DarkGray))];

    for (i, value) in row.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
        let display = RankedTable::truncate(&value.to_display_string(), width);
        let style = if value.is_null() {
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {display:width$} "), style));
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    }

    Line::from(spans)
}

impl Widget for RankedTable<'_> {
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
        let inner = block.inner(area);

        let max_rows = (inner.height as usize)
            .saturating_sub(CHROME_LINES + self.notices.len())
            .max(1);
        let lines = self.render_to_lines(inner.width as usize, max_rows);
        Paragraph::new(lines).block(block).render(area, buf);
    }
}
