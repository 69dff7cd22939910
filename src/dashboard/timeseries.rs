//! Daily close price series for the selected company.

use chrono::NaiveDate;

use crate::warehouse::Table;

pub const TICKER_COLUMN: &str = "TICKER";
pub const DATE_COLUMN: &str = "DATE";
pub const CLOSE_COLUMN: &str = "CLOSE_USD";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    /// The x coordinate of this point.
    pub fn x(&self) -> f64 {
        day_number(self.date)
    }
}

/// Days since the Unix epoch.
pub fn day_number(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

/// Close prices for one ticker, ordered by date ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds the series from a `(DATE, CLOSE_USD)` table.
    ///
    /// Returns `None` when either column is missing. Rows without a date or a
    /// numeric close are dropped.
    pub fn from_table(ticker: &str, table: &Table) -> Option<Self> {
        let date_idx = table.column_index(DATE_COLUMN)?;
        let close_idx = table.column_index(CLOSE_COLUMN)?;

        let mut points: Vec<PricePoint> = table
            .rows
            .iter()
            .filter_map(|row| {
                Some(PricePoint {
                    date: row.get(date_idx)?.as_date()?,
                    close: row.get(close_idx)?.as_f64()?,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);

        Some(Self {
            ticker: ticker.to_string(),
            points,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn title(&self) -> String {
        format!("Daily Close Price for {}", self.ticker)
    }

    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.points.get(index).map(|p| {
            format!(
                "DATE: {}  CLOSE_USD: {:.2}",
                p.date.format("%Y-%m-%d"),
                p.close
            )
        })
    }

    /// `[min, max]` of the close prices, or `None` for an empty series.
    pub fn close_bounds(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.close;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(p.close), hi.max(p.close))
        }))
    }

    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }
}

/// Ticker values of the companies query, in query order, without NULLs.
pub fn tickers_from_table(table: &Table) -> Option<Vec<String>> {
    let idx = table.column_index(TICKER_COLUMN)?;
    Some(
        table
            .column_values(idx)
            .filter(|v| !v.is_null())
            .map(|v| v.to_display_string())
            .collect(),
    )
}
