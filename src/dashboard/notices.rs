//! User-visible error and warning messages, grouped by dashboard section.

use serde::Serialize;

/// Part of the dashboard a notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Warehouse connection, shown in the banner.
    Connection,
    /// Top sectors bar chart.
    Sectors,
    /// Top-quartile company table.
    Ranked,
    /// Company selector list.
    Tickers,
    /// Price chart of the selected company.
    Series,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Connection => "Connection",
            Self::Sectors => "Top 10 Sectors by Position (USD)",
            Self::Ranked => "Top 25% Companies latest data",
            Self::Tickers => "Company selector",
            Self::Series => "Daily close price timeseries for the selected company",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub section: Section,
    pub level: NoticeLevel,
    pub message: String,
}

/// Notices currently on screen.
///
/// Reloading a section clears that section's notices first, so a message
/// stays only as long as the failure it describes.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, section: Section, message: impl Into<String>) {
        self.push(section, NoticeLevel::Error, message);
    }

    pub fn warning(&mut self, section: Section, message: impl Into<String>) {
        self.push(section, NoticeLevel::Warning, message);
    }

    fn push(&mut self, section: Section, level: NoticeLevel, message: impl Into<String>) {
        self.items.push(Notice {
            section,
            level,
            message: message.into(),
        });
    }

    /// Removes every notice of `section`.
    pub fn clear_section(&mut self, section: Section) {
        self.items.retain(|n| n.section != section);
    }

    pub fn for_section(&self, section: Section) -> impl Iterator<Item = &Notice> + '_ {
        self.items.iter().filter(move |n| n.section == section)
    }

    pub fn all(&self) -> &[Notice] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
