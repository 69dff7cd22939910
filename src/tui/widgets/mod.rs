//! TUI widgets for market-glance.

pub mod banner;
pub mod header;
pub mod help;
pub mod price_chart;
pub mod ranked_table;
pub mod sector_chart;
pub mod selector;
