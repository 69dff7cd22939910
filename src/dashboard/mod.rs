//! Dashboard state and section loading.
//!
//! `Dashboard` owns the query runner and everything the three sections show.
//! Every failure is turned into a notice on the section it belongs to; a
//! section whose data could not be fetched simply has no data.

pub mod notices;
pub mod ranked;
pub mod sectors;
pub mod timeseries;

pub use notices::{Notice, NoticeLevel, Notices, Section};
pub use ranked::RankedView;
pub use sectors::{format_usd, SectorBar, SectorChart};
pub use timeseries::{PricePoint, PriceSeries};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::DashError;
use crate::query::{self, QueryFile, QueryRunner};
use crate::warehouse::{Statement, Table};

/// State behind the three dashboard sections.
#[derive(Debug)]
pub struct Dashboard {
    runner: Option<QueryRunner>,
    queries_dir: PathBuf,
    notices: Notices,

    /// Sector bars; `None` until loaded or when the load failed.
    pub sectors: Option<SectorChart>,
    /// Top-quartile table exactly as returned.
    pub ranked: Option<Arc<Table>>,
    /// Tickers offered by the company selector.
    pub tickers: Vec<String>,
    /// Currently selected ticker.
    pub selected: Option<String>,
    /// Price series of the selected ticker.
    pub series: Option<PriceSeries>,
}

impl Dashboard {
    /// Creates a dashboard. Without a runner (no connection) every section
    /// stays empty.
    pub fn new(runner: Option<QueryRunner>, queries_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            queries_dir: queries_dir.into(),
            notices: Notices::new(),
            sectors: None,
            ranked: None,
            tickers: Vec::new(),
            selected: None,
            series: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.runner.is_some()
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Records a failed connection attempt.
    pub fn report_connection_error(&mut self, error: &DashError) {
        self.notices.clear_section(Section::Connection);
        self.notices.error(
            Section::Connection,
            format!(
                "An error occurred while connecting to the warehouse: {}",
                error.message()
            ),
        );
    }

    /// Loads all three sections. Inside the cache TTL this costs no
    /// warehouse round-trips.
    pub async fn refresh_all(&mut self) {
        info!("Refreshing dashboard");
        self.load_sectors().await;
        self.load_ranked().await;
        self.load_tickers().await;
    }

    pub async fn load_sectors(&mut self) {
        self.notices.clear_section(Section::Sectors);
        let table = self.fetch_file(Section::Sectors, QueryFile::TopSectors).await;

        self.sectors = match table {
            Some(table) => {
                let chart = SectorChart::from_table(&table);
                if chart.is_none() {
                    self.notices.warning(
                        Section::Sectors,
                        format!(
                            "Expected columns {} and {}",
                            sectors::SECTOR_NAME_COLUMN,
                            sectors::SECTOR_POSITION_COLUMN
                        ),
                    );
                }
                chart
            }
            None => None,
        };
    }

    pub async fn load_ranked(&mut self) {
        self.notices.clear_section(Section::Ranked);
        self.ranked = self
            .fetch_file(Section::Ranked, QueryFile::RankedCompanies)
            .await;
    }

    /// Loads the ticker list, then the series of the selected ticker.
    ///
    /// The previous selection is kept when it is still offered; otherwise the
    /// first ticker is selected.
    pub async fn load_tickers(&mut self) {
        self.notices.clear_section(Section::Tickers);
        let table = self
            .fetch_file(Section::Tickers, QueryFile::CompanyTickers)
            .await;

        self.tickers = match table.as_deref().map(timeseries::tickers_from_table) {
            Some(Some(tickers)) => tickers,
            Some(None) => {
                self.notices.warning(
                    Section::Tickers,
                    format!("Expected column {}", timeseries::TICKER_COLUMN),
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        let keep = self
            .selected
            .as_ref()
            .is_some_and(|s| self.tickers.contains(s));
        if !keep {
            self.selected = self.tickers.first().cloned();
        }
        debug!("Loaded {} tickers, selected {:?}", self.tickers.len(), self.selected);

        self.fetch_series().await;
    }

    /// Selects a ticker and reloads only the price series.
    ///
    /// Returns false and does nothing when the ticker is already selected or
    /// not in the list.
    pub async fn select_ticker(&mut self, ticker: &str) -> bool {
        if self.selected.as_deref() == Some(ticker) {
            return false;
        }
        if !self.tickers.iter().any(|t| t == ticker) {
            warn!("Ignoring selection of unknown ticker '{}'", ticker);
            return false;
        }

        self.selected = Some(ticker.to_string());
        self.fetch_series().await;
        true
    }

    /// Runs the price statement for the current selection.
    async fn fetch_series(&mut self) {
        self.notices.clear_section(Section::Series);
        self.series = None;

        let Some(ticker) = self.selected.clone() else {
            return;
        };
        let Some(backend) = self.runner.as_ref().map(QueryRunner::backend) else {
            return;
        };

        let statement = query::company_close_prices(&ticker, backend);
        let Some(table) = self.fetch(Section::Series, &statement).await else {
            return;
        };

        self.series = PriceSeries::from_table(&ticker, &table);
        if self.series.is_none() {
            self.notices.warning(
                Section::Series,
                format!(
                    "Expected columns {} and {}",
                    timeseries::DATE_COLUMN,
                    timeseries::CLOSE_COLUMN
                ),
            );
        }
    }

    async fn fetch_file(&mut self, section: Section, file: QueryFile) -> Option<Arc<Table>> {
        if self.runner.is_none() {
            return None;
        }
        match file.load(&self.queries_dir) {
            Ok(statement) => self.fetch(section, &statement).await,
            Err(e) => {
                self.report_query_error(section, &e);
                None
            }
        }
    }

    /// Runs one statement. A failure becomes exactly one error notice.
    async fn fetch(&mut self, section: Section, statement: &Statement) -> Option<Arc<Table>> {
        let runner = self.runner.as_mut()?;
        match runner.run(statement).await {
            Ok(table) => Some(table),
            Err(e) => {
                self.report_query_error(section, &e);
                None
            }
        }
    }

    fn report_query_error(&mut self, section: Section, error: &DashError) {
        warn!("{} failed: {}", section.title(), error);
        self.notices.error(
            section,
            format!(
                "An error occurred while executing the query: {}",
                error.message()
            ),
        );
    }
}
