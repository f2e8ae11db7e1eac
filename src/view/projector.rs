//! Filtering, sorting and severity coloring of risk records

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::models::{Filter, RiskRecord, SortKey, Status};

/// Display color attached to a severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Purple,
    Red,
    Amber,
    Green,
}

impl Color {
    /// Hex code used by the charts
    pub fn hex(&self) -> &'static str {
        match self {
            Color::Purple => "#7e22ce",
            Color::Red => "#dc2626",
            Color::Amber => "#f59e0b",
            Color::Green => "#16a34a",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Color::Purple => "purple",
            Color::Red => "red",
            Color::Amber => "amber",
            Color::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a status to its display color
///
/// Total over every label: anything unrecognized gets the `normal` color.
pub fn severity_color(status: &Status) -> Color {
    match status {
        Status::Suspicious => Color::Purple,
        Status::HighRisk => Color::Red,
        Status::Risk => Color::Amber,
        Status::Normal | Status::Unknown(_) => Color::Green,
    }
}

/// Filter and sort records for display
///
/// Returns a new vector; the input is left untouched. Score ordering is
/// descending and stable for ties; id ordering is ascending.
pub fn project(records: &[RiskRecord], filter: &Filter, sort_key: SortKey) -> Vec<RiskRecord> {
    let mut projected: Vec<RiskRecord> = records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();

    match sort_key {
        SortKey::Score => projected.sort_by(|a, b| b.score.total_cmp(&a.score)),
        SortKey::Id => projected.sort_by(|a, b| locale_compare(&a.id, &b.id)),
    }

    projected
}

/// Case-insensitive comparison with lowercase ordered before uppercase
/// when two strings differ only by case
///
/// Approximates ICU collation: after case folding, characters compare by
/// code point, so punctuation does not follow ICU order (`u_1` sorts
/// after `u1` here, before it under ICU).
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| b.cmp(a))
}
