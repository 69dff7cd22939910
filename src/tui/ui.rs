//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{
    banner::Banner, header::Header, help::KeyHints, price_chart::PriceChartPanel,
    ranked_table::RankedTable, sector_chart::SectorChartPanel, selector::TickerDropdown,
};
use crate::dashboard::Section;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let notices = app.dashboard.notices();

    let banner = Banner::new(notices.for_section(Section::Connection));
    let banner_height = banner.height(area.width);

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Header
            Constraint::Length(banner_height), // Connection notice
            Constraint::Min(6),                // Sections
            Constraint::Length(1),             // Key hints
        ])
        .split(area);

    frame.render_widget(
        Header::new(&app.connection_label, app.is_connected()),
        main_layout[0],
    );
    frame.render_widget(banner, main_layout[1]);
    render_sections(frame, main_layout[2], app);
    frame.render_widget(
        KeyHints::new(app.focus, app.dropdown.is_some()),
        main_layout[3],
    );
}

/// Sectors and ranked table side by side, the price chart below.
fn render_sections(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    let dashboard = &app.dashboard;
    let notices = dashboard.notices();

    frame.render_widget(
        SectorChartPanel::new(
            dashboard.sectors.as_ref(),
            notices.for_section(Section::Sectors),
            app.sector_index().filter(|_| app.focus == Focus::Sectors),
            app.focus == Focus::Sectors,
        ),
        top[0],
    );

    frame.render_widget(
        RankedTable::new(
            dashboard.ranked.as_deref(),
            app.ranked_view,
            notices.for_section(Section::Ranked),
            app.focus == Focus::Ranked,
        ),
        top[1],
    );

    let series_notices = notices
        .for_section(Section::Tickers)
        .chain(notices.for_section(Section::Series));
    frame.render_widget(
        PriceChartPanel::new(
            dashboard.selected.as_deref(),
            !dashboard.tickers.is_empty(),
            dashboard.series.as_ref(),
            series_notices,
        )
        .highlighted(app.series_index().filter(|_| app.focus == Focus::Series))
        .focused(app.focus == Focus::Series),
        rows[1],
    );

    if let Some(highlighted) = app.dropdown {
        let popup = TickerDropdown::popup_area(rows[1], dashboard.tickers.len());
        frame.render_widget(
            TickerDropdown::new(&dashboard.tickers, highlighted, dashboard.selected.as_deref()),
            popup,
        );
    }
}
