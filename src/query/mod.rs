//! Query files, statements and cached execution.
//!
//! The dashboard's SQL lives in plain `.sql` files under the queries
//! directory. This module loads them, builds the one ad-hoc statement (daily
//! close prices for a ticker) and runs statements through a TTL cache.

mod cache;
mod guard;
mod runner;

pub use cache::ResultCache;
pub use guard::ReadOnlyGuard;
pub use runner::QueryRunner;

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DashError, Result};
use crate::warehouse::{Statement, WarehouseBackend};

/// The SQL files the dashboard reads from its queries directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFile {
    /// Sector totals for the bar chart.
    TopSectors,
    /// Top-quartile companies for the ranked table.
    RankedCompanies,
    /// Tickers for the company selector.
    CompanyTickers,
}

impl QueryFile {
    pub const ALL: [QueryFile; 3] = [
        QueryFile::TopSectors,
        QueryFile::RankedCompanies,
        QueryFile::CompanyTickers,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::TopSectors => "top_10_sectors.sql",
            Self::RankedCompanies => "top_25_percent_data.sql",
            Self::CompanyTickers => "companies_names.sql",
        }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Reads this query from `dir` as a parameterless statement.
    pub fn load(&self, dir: &Path) -> Result<Statement> {
        load_query_from_file(&self.path_in(dir)).map(Statement::new)
    }
}

/// Returns the exact contents of a SQL file.
pub fn load_query_from_file(path: &Path) -> Result<String> {
    debug!("Loading query from {}", path.display());
    std::fs::read_to_string(path).map_err(|e| {
        DashError::query(format!("Failed to read query file {}: {e}", path.display()))
    })
}

/// Daily close prices for one ticker, oldest first.
///
/// The ticker is always bound as a parameter.
pub fn company_close_prices(ticker: &str, backend: WarehouseBackend) -> Statement {
    let sql = format!(
        "SELECT p.date, c.ticker, p.close_usd\n\
         FROM price p\n\
         JOIN company c ON p.company_id = c.id\n\
         WHERE c.ticker = {}\n\
         ORDER BY p.date ASC",
        backend.placeholder(1)
    );
    Statement::new(sql).bind(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::Value;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_load_returns_exact_content() {
        let dir = TempDir::new().unwrap();
        let content = "-- header\nSELECT sector_name\n  FROM sector;\n\n";
        std::fs::write(dir.path().join("top_10_sectors.sql"), content).unwrap();

        let stmt = QueryFile::TopSectors.load(dir.path()).unwrap();
        assert_eq!(stmt.sql(), content);
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_missing_file_is_query_error() {
        let dir = TempDir::new().unwrap();
        let err = QueryFile::CompanyTickers.load(dir.path()).unwrap_err();
        assert_eq!(err.category(), "Query Error");
        assert!(err.to_string().contains("companies_names.sql"));
    }

    #[test]
    fn test_price_statement_binds_ticker() {
        let stmt = company_close_prices("ABC", WarehouseBackend::Snowflake);
        assert!(stmt.sql().contains("c.ticker = ?"));
        assert!(stmt.sql().ends_with("ORDER BY p.date ASC"));
        assert!(!stmt.sql().contains("ABC"));
        assert_eq!(stmt.params(), &[Value::from("ABC")]);

        let pg = company_close_prices("ABC", WarehouseBackend::Postgres);
        assert!(pg.sql().contains("c.ticker = $1"));
    }

    #[test]
    fn test_quote_in_ticker_stays_a_parameter() {
        let stmt = company_close_prices("X' OR '1'='1", WarehouseBackend::Snowflake);
        assert!(!stmt.sql().contains("OR '1'"));
        assert_eq!(stmt.params(), &[Value::from("X' OR '1'='1")]);
    }

    #[test]
    fn test_shipped_query_files_exist() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("queries");
        for file in QueryFile::ALL {
            assert!(file.load(&dir).is_ok(), "missing {}", file.file_name());
        }
    }
}
