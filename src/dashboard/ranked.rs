//! View state for the ranked company table.
//!
//! The table itself is shown exactly as the query returned it; sorting and
//! scrolling only change which rows are drawn and in what order.

use std::cmp::Ordering;

use crate::warehouse::{Row, Table};

/// Sort and scroll state of the ranked table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankedView {
    /// Column the view is sorted by; `None` keeps query order.
    pub sort_column: Option<usize>,
    pub descending: bool,
    /// Index of the first visible row.
    pub scroll: usize,
}

impl RankedView {
    /// Moves the sort to the next column, then back to query order.
    pub fn cycle_sort_column(&mut self, column_count: usize) {
        self.sort_column = match self.sort_column {
            None if column_count > 0 => Some(0),
            Some(c) if c + 1 < column_count => Some(c + 1),
            _ => None,
        };
        self.scroll = 0;
    }

    pub fn reverse(&mut self) {
        self.descending = !self.descending;
        self.scroll = 0;
    }

    pub fn scroll_by(&mut self, delta: isize, row_count: usize, visible: usize) {
        let max_scroll = row_count.saturating_sub(visible.max(1));
        self.scroll = self.scroll.saturating_add_signed(delta).min(max_scroll);
    }

    /// Rows in display order. The table is never modified.
    pub fn rows<'t>(&self, table: &'t Table) -> Vec<&'t Row> {
        let mut rows: Vec<&Row> = table.rows.iter().collect();
        if let Some(column) = self.sort_column {
            rows.sort_by(|a, b| compare_at(a, b, column));
        }
        if self.descending {
            rows.reverse();
        }
        rows
    }
}

fn compare_at(a: &Row, b: &Row, column: usize) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(x), Some(y)) => x.sort_cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
