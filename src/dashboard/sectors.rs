//! Bar data for the top sectors chart.

use tracing::debug;

use crate::warehouse::Table;

pub const SECTOR_NAME_COLUMN: &str = "SECTOR_NAME";
pub const SECTOR_POSITION_COLUMN: &str = "SECTOR_POSITION_USD";

/// Gradient end for the smallest position.
pub const GRADIENT_LOW: (u8, u8, u8) = (0xc6, 0xdb, 0xef);
/// Gradient end for the largest position.
pub const GRADIENT_HIGH: (u8, u8, u8) = (0x08, 0x30, 0x6b);

/// One sector bar, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorBar {
    pub name: String,
    pub position: f64,
    /// `position` formatted as USD.
    pub label: String,
    /// Bar length in `0.0..=1.0` on a logarithmic scale.
    pub fraction: f64,
    /// Gradient color, linear in `position`.
    pub color: (u8, u8, u8),
}

/// Sector bars sorted from the largest position to the smallest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorChart {
    pub bars: Vec<SectorBar>,
}

impl SectorChart {
    /// Builds the chart from a `(SECTOR_NAME, SECTOR_POSITION_USD)` table.
    ///
    /// Returns `None` when either column is missing. Rows whose position is
    /// not numeric are skipped.
    pub fn from_table(table: &Table) -> Option<Self> {
        let name_idx = table.column_index(SECTOR_NAME_COLUMN)?;
        let position_idx = table.column_index(SECTOR_POSITION_COLUMN)?;

        let mut entries: Vec<(String, f64)> = table
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get(name_idx)?.to_display_string();
                match row.get(position_idx).and_then(|v| v.as_f64()) {
                    Some(position) if position.is_finite() => Some((name, position)),
                    _ => {
                        debug!("Skipping sector '{}' without a numeric position", name);
                        None
                    }
                }
            })
            .collect();

        entries.sort_by(|a, b| b.1.total_cmp(&a.1));

        let max = entries.first().map(|e| e.1).unwrap_or(0.0);
        let min = entries.last().map(|e| e.1).unwrap_or(0.0);

        let bars = entries
            .into_iter()
            .map(|(name, position)| SectorBar {
                label: format_usd(position),
                fraction: log_fraction(position, max),
                color: gradient_color(position, min, max),
                name,
                position,
            })
            .collect();

        Some(Self { bars })
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Tooltip text for the bar at `index`.
    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.bars.get(index).map(|bar| {
            format!(
                "Sector Name: {}  Position (USD): {}",
                bar.name, bar.label
            )
        })
    }
}

/// Length of a bar relative to the largest one, on a log scale.
///
/// Non-positive values have no place on a log axis and get a zero-length bar.
fn log_fraction(value: f64, max: f64) -> f64 {
    if value <= 0.0 || max <= 0.0 {
        return 0.0;
    }
    (value.ln_1p() / max.ln_1p()).clamp(0.0, 1.0)
}

fn gradient_color(value: f64, min: f64, max: f64) -> (u8, u8, u8) {
    let t = if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    (
        lerp(GRADIENT_LOW.0, GRADIENT_HIGH.0),
        lerp(GRADIENT_LOW.1, GRADIENT_HIGH.1),
        lerp(GRADIENT_LOW.2, GRADIENT_HIGH.2),
    )
}

/// Formats an amount as US dollars with thousands separators and two
/// decimals, e.g. `$1,234.56`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let cents = (value.abs() * 100.0).round() as u128;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
