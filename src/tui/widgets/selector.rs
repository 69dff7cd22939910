//! Company dropdown for the time-series panel.
//!
//! A floating list of tickers drawn over the price chart while the user
//! picks a company.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Widget},
};

/// Ticker dropdown popup widget.
pub struct TickerDropdown<'a> {
    tickers: &'a [String],
    highlighted: usize,
    selected: Option<&'a str>,
}

impl<'a> TickerDropdown<'a> {
    pub fn new(tickers: &'a [String], highlighted: usize, selected: Option<&'a str>) -> Self {
        Self {
            tickers,
            highlighted,
            selected,
        }
    }

    /// Places the popup below the selector line of the series panel.
    pub fn popup_area(panel: Rect, item_count: usize) -> Rect {
        let x = panel.x + 10;
        let y = panel.y + 2;
        let width = 24.min(panel.width.saturating_sub(12));
        let height = (item_count as u16 + 2)
            .min(12)
            .min(panel.bottom().saturating_sub(y));
        Rect::new(x, y, width, height)
    }
}

impl Widget for TickerDropdown<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Company ");
        let inner = block.inner(area);
        block.render(area, buf);

        let max_items = inner.height as usize;
        if max_items == 0 {
            return;
        }
        // keep the highlighted entry visible
        let scroll_offset = self.highlighted.saturating_sub(max_items - 1);

        for (row, (idx, ticker)) in self
            .tickers
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(max_items)
            .enumerate()
        {
            let y = inner.y + row as u16;
            let is_highlighted = idx == self.highlighted;

            let style = if is_highlighted {
                Style::default()
                    .bg(Color::DarkGray)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            if is_highlighted {
                for x in inner.x..inner.x + inner.width {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_style(style);
                    }
                }
            }

            let marker = if self.selected == Some(ticker.as_str()) {
                "✓ "
            } else {
                "  "
            };
            buf.set_stringn(
                inner.x,
                y,
                format!("{marker}{ticker}"),
                inner.width as usize,
                style,
            );
        }
    }
}
