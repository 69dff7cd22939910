//! Mock warehouses for testing and headless demos.
//!
//! `MockWarehouse` answers statements from an in-memory table of canned
//! responses and records every statement it receives. `FailingWarehouse`
//! rejects everything, as a warehouse that went away would.

use super::{ColumnInfo, Row, Statement, Table, Value, Warehouse, WarehouseBackend};
use crate::error::{DashError, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type Handler = Box<dyn Fn(&Statement) -> Result<Table> + Send + Sync>;

/// Number of daily prices generated per demo ticker.
const DEMO_PRICE_DAYS: i64 = 30;

/// An in-memory warehouse with canned responses.
///
/// Responses are matched by a case-insensitive substring ("needle") of the SQL
/// text, in registration order. Statements matching no needle return an empty
/// table.
pub struct MockWarehouse {
    backend: WarehouseBackend,
    responses: Vec<(String, Handler)>,
    executed: Mutex<Vec<Statement>>,
    closed: AtomicBool,
}

impl MockWarehouse {
    /// Creates a mock with no canned responses.
    pub fn new() -> Self {
        Self {
            backend: WarehouseBackend::Snowflake,
            responses: Vec::new(),
            executed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Sets the backend the mock reports (drives placeholder syntax).
    pub fn with_backend(mut self, backend: WarehouseBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Answers statements containing `needle` with a copy of `table`.
    pub fn with_table(self, needle: impl Into<String>, table: Table) -> Self {
        self.with_handler(needle, move |_| Ok(table.clone()))
    }

    /// Answers statements containing `needle` with a query error.
    pub fn with_error(self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        self.with_handler(needle, move |_| Err(DashError::query(message.clone())))
    }

    /// Answers statements containing `needle` by calling `handler`.
    pub fn with_handler<F>(mut self, needle: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<Table> + Send + Sync + 'static,
    {
        self.responses
            .push((needle.into().to_lowercase(), Box::new(handler)));
        self
    }

    /// Statements executed so far, oldest first.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of statements executed so far.
    pub fn execution_count(&self) -> usize {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// A mock with no data at all: every statement returns an empty table.
    pub fn empty() -> Self {
        Self::new()
    }

    /// A mock serving a small, deterministic market data set for the three
    /// dashboard queries and the per-ticker price statement.
    pub fn demo() -> Self {
        Self::new()
            .with_table("sector_position_usd", demo_sectors())
            .with_table("quartile", demo_ranked())
            .with_table("distinct ticker", demo_tickers())
            .with_handler("c.ticker =", |statement| {
                let ticker = statement
                    .params()
                    .first()
                    .map(Value::to_display_string)
                    .unwrap_or_default();
                Ok(demo_prices(&ticker))
            })
    }
}

impl Default for MockWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockWarehouse")
            .field("backend", &self.backend)
            .field("responses", &self.responses.len())
            .field("executed", &self.execution_count())
            .finish()
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    fn backend(&self) -> WarehouseBackend {
        self.backend
    }

    async fn execute(&self, statement: &Statement) -> Result<Table> {
        if self.is_closed() {
            return Err(DashError::connection("Connection is closed"));
        }

        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.clone());

        let sql = statement.sql().to_lowercase();
        let table = match self
            .responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
        {
            Some((_, handler)) => handler(statement)?,
            None => Table::new(),
        };
        Ok(table.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A warehouse that rejects every statement with a connection error.
#[derive(Debug, Default)]
pub struct FailingWarehouse {
    attempts: AtomicUsize,
}

impl FailingWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statements that were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Warehouse for FailingWarehouse {
    fn backend(&self) -> WarehouseBackend {
        WarehouseBackend::Snowflake
    }

    async fn execute(&self, _statement: &Statement) -> Result<Table> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DashError::connection("Warehouse is unreachable"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

// === Demo data ===

const DEMO_COMPANIES: [(&str, &str, &str, f64, f64); 5] = [
    ("AAPL", "Apple Inc.", "Information Technology", 189.95, 2_934_000_000_000.0),
    ("JPM", "JPMorgan Chase & Co.", "Financials", 196.62, 565_100_000_000.0),
    ("MSFT", "Microsoft Corporation", "Information Technology", 415.50, 3_088_000_000_000.0),
    ("NVDA", "NVIDIA Corporation", "Information Technology", 903.56, 2_259_000_000_000.0),
    ("XOM", "Exxon Mobil Corporation", "Energy", 118.43, 469_800_000_000.0),
];

fn demo_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
}

fn demo_sectors() -> Table {
    let rows: Vec<Row> = [
        ("Information Technology", 48_123_456.78),
        ("Financials", 21_904_112.05),
        ("Health Care", 15_230_870.40),
        ("Consumer Discretionary", 9_876_543.21),
        ("Industrials", 7_450_019.99),
        ("Communication Services", 5_002_310.50),
        ("Energy", 3_318_775.00),
        ("Consumer Staples", 1_204_660.12),
        ("Materials", 412_905.33),
        ("Utilities", 845.10),
    ]
    .into_iter()
    .map(|(name, position)| vec![Value::from(name), Value::Float(position)])
    .collect();

    Table::with_data(
        vec![
            ColumnInfo::new("SECTOR_NAME", "text"),
            ColumnInfo::new("SECTOR_POSITION_USD", "fixed"),
        ],
        rows,
    )
}

fn demo_ranked() -> Table {
    let as_of = demo_start_date() + ChronoDuration::days(DEMO_PRICE_DAYS - 1);
    let mut companies = DEMO_COMPANIES.to_vec();
    companies.sort_by(|a, b| b.4.total_cmp(&a.4));

    let rows = companies
        .into_iter()
        .map(|(ticker, name, sector, close, market_cap)| {
            vec![
                Value::from(ticker),
                Value::from(name),
                Value::from(sector),
                Value::Float(market_cap),
                Value::Float(close),
                Value::Date(as_of),
            ]
        })
        .collect();

    Table::with_data(
        vec![
            ColumnInfo::new("TICKER", "text"),
            ColumnInfo::new("COMPANY_NAME", "text"),
            ColumnInfo::new("SECTOR_NAME", "text"),
            ColumnInfo::new("MARKET_CAP_USD", "fixed"),
            ColumnInfo::new("CLOSE_USD", "fixed"),
            ColumnInfo::new("AS_OF_DATE", "date"),
        ],
        rows,
    )
}

fn demo_tickers() -> Table {
    Table::with_data(
        vec![ColumnInfo::new("TICKER", "text")],
        DEMO_COMPANIES
            .iter()
            .map(|(ticker, ..)| vec![Value::from(*ticker)])
            .collect(),
    )
}

/// Deterministic daily closes ending at the company's latest close.
fn demo_prices(ticker: &str) -> Table {
    let columns = vec![
        ColumnInfo::new("DATE", "date"),
        ColumnInfo::new("TICKER", "text"),
        ColumnInfo::new("CLOSE_USD", "fixed"),
    ];
    let Some(&(_, _, _, last_close, _)) = DEMO_COMPANIES.iter().find(|c| c.0 == ticker) else {
        return Table::with_data(columns, Vec::new());
    };

    let seed = ticker.bytes().map(i64::from).sum::<i64>();
    let start = demo_start_date();
    let rows = (0..DEMO_PRICE_DAYS)
        .map(|day| {
            let days_left = (DEMO_PRICE_DAYS - 1 - day) as f64;
            let wiggle = ((day * 7 + seed) % 11 - 5) as f64 / 100.0;
            let close = last_close * (1.0 - days_left * 0.004 + wiggle * 0.5);
            vec![
                Value::Date(start + ChronoDuration::days(day)),
                Value::from(ticker),
                Value::Float((close * 100.0).round() / 100.0),
            ]
        })
        .collect();

    Table::with_data(columns, rows)
}
