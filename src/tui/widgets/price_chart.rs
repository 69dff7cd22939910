//! Time-series panel: company selector line and daily close price chart.

use crate::dashboard::timeseries::day_number;
use crate::dashboard::{Notice, PriceSeries};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use super::banner::Banner;

pub const TITLE: &str = "Daily close price timeseries for the selected company";
pub const NO_COMPANIES: &str = "No companies available to select.";
pub const NO_DATA: &str = "No data available for the selected company.";

/// Time-series panel widget.
pub struct PriceChartPanel<'a> {
    selected: Option<&'a str>,
    has_tickers: bool,
    series: Option<&'a PriceSeries>,
    notices: Vec<&'a Notice>,
    highlighted: Option<usize>,
    focused: bool,
}

impl<'a> PriceChartPanel<'a> {
    pub fn new(
        selected: Option<&'a str>,
        has_tickers: bool,
        series: Option<&'a PriceSeries>,
        notices: impl IntoIterator<Item = &'a Notice>,
    ) -> Self {
        Self {
            selected,
            has_tickers,
            series,
            notices: notices.into_iter().collect(),
            highlighted: None,
            focused: false,
        }
    }

    pub fn highlighted(mut self, index: Option<usize>) -> Self {
        self.highlighted = index;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Message shown instead of the chart, if any.
    ///
    /// A failed price fetch shows only its error notice.
    pub fn placeholder(&self) -> Option<&'static str> {
        if !self.has_tickers {
            return Some(NO_COMPANIES);
        }
        match self.series {
            Some(series) if series.is_empty() => Some(NO_DATA),
            Some(_) => None,
            None if self.notices.is_empty() => Some(NO_DATA),
            None => None,
        }
    }

    /// The selector line, e.g. `Company: [AAPL ▾]  (Enter to change)`.
    pub fn selector_line(&self) -> Line<'a> {
        let value = self.selected.unwrap_or("-");
        let mut spans = vec![
            Span::raw("Company: "),
            Span::styled(
                format!("[{value} ▾]"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if self.focused && self.has_tickers {
            spans.push(Span::styled(
                "  (Enter to change)",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }

    fn render_chart(&self, series: &PriceSeries, area: Rect, buf: &mut Buffer) {
        let (Some((lo, hi)), Some((first, last))) = (series.close_bounds(), series.date_bounds())
        else {
            return;
        };
        let points: Vec<(f64, f64)> = series.points.iter().map(|p| (p.x(), p.close)).collect();
        let cursor: Vec<(f64, f64)> = self
            .highlighted
            .and_then(|i| points.get(i).copied())
            .into_iter()
            .collect();

        let pad = ((hi - lo) * 0.05).max(0.5);
        let (y_lo, y_hi) = ((lo - pad).max(0.0), hi + pad);
        let x_lo = day_number(first);
        // a single point still needs a non-empty x range
        let x_hi = day_number(last).max(x_lo + 1.0);

        let datasets = vec![
            Dataset::default()
                .name(series.ticker.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&points),
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Yellow))
                .data(&cursor),
        ];

        let axis_style = Style::default().fg(Color::DarkGray);
        let chart = Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("DATE")
                    .style(axis_style)
                    .bounds([x_lo, x_hi])
                    .labels(vec![
                        Span::raw(first.format("%Y-%m-%d").to_string()),
                        Span::raw(last.format("%Y-%m-%d").to_string()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("CLOSE_USD")
                    .style(axis_style)
                    .bounds([y_lo, y_hi])
                    .labels(vec![
                        Span::raw(format!("{y_lo:.2}")),
                        Span::raw(format!("{:.2}", (y_lo + y_hi) / 2.0)),
                        Span::raw(format!("{y_hi:.2}")),
                    ]),
            );
        chart.render(area, buf);
    }
}

impl Widget for PriceChartPanel<'_> {
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
        block.render(area, buf);

        let mut header = vec![self.selector_line()];
        header.extend(Banner::new(self.notices.iter().copied()).lines());
        if let Some(message) = self.placeholder() {
            header.push(Line::from(Span::styled(
                message,
                Style::default().fg(Color::Yellow),
            )));
        }

        let chart_series = self
            .series
            .filter(|s| !s.is_empty() && self.placeholder().is_none());
        let Some(series) = chart_series else {
            Paragraph::new(header).render(inner, buf);
            return;
        };

        header.push(Line::from(Span::styled(
            series.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let tooltip = self.highlighted.and_then(|i| series.tooltip(i));

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header.len() as u16),
                Constraint::Min(3),
                Constraint::Length(u16::from(tooltip.is_some())),
            ])
            .split(inner);

        Paragraph::new(header).render(layout[0], buf);
        self.render_chart(series, layout[1], buf);
        if let Some(tooltip) = tooltip {
            Paragraph::new(Line::from(Span::styled(
                tooltip,
                Style::default().fg(Color::Cyan),
            )))
            .render(layout[2], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Notices, PricePoint, Section};
    use chrono::NaiveDate;

    fn series(n: u32) -> PriceSeries {
        PriceSeries {
            ticker: "ABC".to_string(),
            points: (1..=n)
                .map(|d| PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
                    close: 10.0 + d as f64,
                })
                .collect(),
        }
    }

    fn screen(panel: PriceChartPanel, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        panel.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_no_tickers_message() {
        let panel = PriceChartPanel::new(None, false, None, []);
        assert_eq!(panel.placeholder(), Some(NO_COMPANIES));
        assert!(screen(panel, 70, 8).contains(NO_COMPANIES));
    }

    #[test]
    fn test_empty_series_message() {
        let empty = series(0);
        let panel = PriceChartPanel::new(Some("ABC"), true, Some(&empty), []);
        assert_eq!(panel.placeholder(), Some(NO_DATA));
    }

    #[test]
    fn test_failed_fetch_shows_only_the_error() {
        let mut notices = Notices::new();
        notices.error(Section::Series, "boom");
        let panel = PriceChartPanel::new(Some("ABC"), true, None, notices.all());
        assert_eq!(panel.placeholder(), None);
        let text = screen(panel, 70, 8);
        assert!(text.contains("Error: boom"));
        assert!(!text.contains(NO_DATA));
    }

    #[test]
    fn test_chart_title_and_tooltip() {
        let s = series(5);
        let panel = PriceChartPanel::new(Some("ABC"), true, Some(&s), [])
            .highlighted(Some(4))
            .focused(true);
        let text = screen(panel, 80, 20);
        assert!(text.contains("Company: [ABC ▾]"));
        assert!(text.contains("Daily Close Price for ABC"));
        assert!(text.contains("DATE: 2024-03-05  CLOSE_USD: 15.00"));
    }
}
