//! Render-ready data handed to the presentation layer
//!
//! Nothing here draws anything; these are the shapes a renderer
//! (console, JSON, a web page) consumes.

pub mod projector;
pub mod trend;

pub use projector::{locale_compare, project, severity_color, Color};
pub use trend::{synthesize, synthesize_with, TrendPoint, TREND_FLOOR, TREND_POINTS};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Filter, RiskRecord, SortKey, Status};

/// Outcome of the most recent fetch, observable by testers and UIs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready { at: DateTime<Utc> },
    Failed { at: DateTime<Utc>, message: String },
}

/// One selectable card in the record list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub score: f64,
    pub status: Status,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub color: Color,
}

impl From<&RiskRecord> for Card {
    fn from(record: &RiskRecord) -> Self {
        Card {
            id: record.id.clone(),
            score: record.score,
            status: record.status.clone(),
            reasons: record.reasons.clone(),
            ip: record.ip.clone(),
            color: severity_color(&record.status),
        }
    }
}

/// One bar of the aggregate chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub id: String,
    pub score: f64,
    pub color: Color,
}

impl From<&RiskRecord> for BarPoint {
    fn from(record: &RiskRecord) -> Self {
        BarPoint {
            id: record.id.clone(),
            score: record.score,
            color: severity_color(&record.status),
        }
    }
}

/// Detail panel for the selected record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
    pub id: String,
    pub color: Color,
    pub trend: Vec<TrendPoint>,
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub authorized: bool,
    pub loading: bool,
    pub filter: Filter,
    pub sort_key: SortKey,
    pub model: String,
    pub filter_options: Vec<Filter>,
    pub sort_options: Vec<SortKey>,
    pub model_options: Vec<String>,
    pub fetch_status: FetchStatus,
    pub cards: Vec<Card>,
    pub bars: Vec<BarPoint>,
    pub detail: Option<Detail>,
}

impl DashboardView {
    /// Build cards and bars from already projected records
    pub fn from_projection(projected: &[RiskRecord]) -> (Vec<Card>, Vec<BarPoint>) {
        let cards = projected.iter().map(Card::from).collect();
        let bars = projected.iter().map(BarPoint::from).collect();
        (cards, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_and_bars_follow_projection_order() {
        let projected = vec![
            RiskRecord::new("u4", 95.0, "suspicious"),
            RiskRecord::new("u2", 10.0, "normal"),
        ];

        let (cards, bars) = DashboardView::from_projection(&projected);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].color, Color::Purple);
        assert_eq!(bars[1].id, "u2");
        assert_eq!(bars[1].color, Color::Green);
    }

    #[test]
    fn test_fetch_status_serialization() {
        let json = serde_json::to_value(FetchStatus::Idle).unwrap();
        assert_eq!(json["state"], "idle");

        let failed = FetchStatus::Failed {
            at: Utc::now(),
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "boom");
    }
}
