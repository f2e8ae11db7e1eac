//! Risk records as delivered by the scoring backend
//!
//! Decoding is deliberately lenient: the backend output is not
//! validated, so missing or oddly typed fields degrade to sensible
//! defaults instead of failing the whole response.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing a selector value (filter, sort key)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unknown filter: {0}")]
    Filter(String),

    #[error("Unknown sort key: {0}")]
    SortKey(String),
}

/// Severity category attached to a record by the scoring model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Normal,
    Risk,
    HighRisk,
    Suspicious,
    /// Any label the backend sends that we don't recognize, kept verbatim
    Unknown(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Normal => "normal",
            Status::Risk => "risk",
            Status::HighRisk => "high risk",
            Status::Suspicious => "suspicious",
            Status::Unknown(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Status::Unknown(_))
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown(String::new())
    }
}

impl From<String> for Status {
    fn from(label: String) -> Self {
        match label.as_str() {
            "normal" => Status::Normal,
            "risk" => Status::Risk,
            "high risk" => Status::HighRisk,
            "suspicious" => Status::Suspicious,
            _ => Status::Unknown(label),
        }
    }
}

impl From<&str> for Status {
    fn from(label: &str) -> Self {
        Status::from(label.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity's scoring snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasons: Vec<String>,
    /// Source address of the entity, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl RiskRecord {
    pub fn new(id: impl Into<String>, score: f64, status: impl Into<Status>) -> Self {
        RiskRecord {
            id: id.into(),
            score,
            status: status.into(),
            reasons: Vec::new(),
            ip: None,
        }
    }

    pub fn with_reasons<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reasons = reasons.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(text)) => text,
        Some(RawId::Integer(n)) => n.to_string(),
        Some(RawId::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Status filter applied before display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(Status),
}

impl Filter {
    /// Exact label match, no case or whitespace normalization
    pub fn matches(&self, record: &RiskRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(status) => record.status.as_str() == status.as_str(),
        }
    }

    /// Every selectable filter, in display order
    pub fn options() -> [Filter; 5] {
        [
            Filter::All,
            Filter::Only(Status::Normal),
            Filter::Only(Status::Risk),
            Filter::Only(Status::HighRisk),
            Filter::Only(Status::Suspicious),
        ]
    }
}

impl FromStr for Filter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Filter::All);
        }
        match Status::from(s) {
            Status::Unknown(label) => Err(ParseError::Filter(label)),
            status => Ok(Filter::Only(status)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Only(status) => f.write_str(status.as_str()),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordering applied to the filtered records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Id,
    Score,
}

impl SortKey {
    /// Every selectable sort key, in display order
    pub fn options() -> [SortKey; 2] {
        [SortKey::Id, SortKey::Score]
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortKey::Id),
            "score" => Ok(SortKey::Score),
            other => Err(ParseError::SortKey(other.to_string())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Id => f.write_str("id"),
            SortKey::Score => f.write_str("score"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_backend_record() {
        let json = r#"{"id": 17, "ip": "10.0.0.4", "score": 62, "status": "suspicious",
                       "reasons": ["Unusual network activity", "Remote login detected"]}"#;
        let record: RiskRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "17");
        assert_eq!(record.score, 62.0);
        assert_eq!(record.status, Status::Suspicious);
        assert_eq!(record.reasons[1], "Remote login detected");
        assert_eq!(record.ip.as_deref(), Some("10.0.0.4"));
    }

    #[test]
    fn test_decode_missing_and_null_fields() {
        let record: RiskRecord = serde_json::from_str(r#"{"id": "u9", "reasons": null}"#).unwrap();

        assert_eq!(record.score, 0.0);
        assert!(record.reasons.is_empty());
        assert_eq!(record.status, Status::Unknown(String::new()));
        assert!(record.ip.is_none());
    }

    #[test]
    fn test_decode_record_without_id() {
        let records: Vec<RiskRecord> =
            serde_json::from_str(r#"[{"score": 12}, {"id": null, "status": "risk"}]"#).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id.is_empty()));
        assert_eq!(records[1].status, Status::Risk);
    }

    #[test]
    fn test_unknown_status_preserved() {
        let record: RiskRecord =
            serde_json::from_str(r#"{"id": "u1", "score": 3.5, "status": "Critical "}"#).unwrap();

        assert_eq!(record.status, Status::Unknown("Critical ".to_string()));
        assert_eq!(record.status.as_str(), "Critical ");
        assert!(!record.status.is_known());
    }

    #[test]
    fn test_status_serializes_as_label() {
        let record = RiskRecord::new("u1", 80.0, Status::HighRisk);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "high risk");
        assert!(json.get("ip").is_none());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<Filter>().unwrap(), Filter::All);
        assert_eq!(
            "high risk".parse::<Filter>().unwrap(),
            Filter::Only(Status::HighRisk)
        );
        assert!("High Risk".parse::<Filter>().is_err());
        assert!("".parse::<Filter>().is_err());
    }

    #[test]
    fn test_filter_exact_match() {
        let filter = Filter::Only(Status::Risk);

        assert!(filter.matches(&RiskRecord::new("a", 1.0, "risk")));
        assert!(!filter.matches(&RiskRecord::new("b", 1.0, "Risk")));
        assert!(!filter.matches(&RiskRecord::new("c", 1.0, "high risk")));
        assert!(Filter::All.matches(&RiskRecord::new("d", 1.0, "whatever")));
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("id".parse::<SortKey>().unwrap(), SortKey::Id);
        assert_eq!("score".parse::<SortKey>().unwrap(), SortKey::Score);
        assert_eq!(
            "name".parse::<SortKey>(),
            Err(ParseError::SortKey("name".to_string()))
        );
    }

    #[test]
    fn test_filter_options_round_trip_display() {
        for filter in Filter::options() {
            assert_eq!(filter.to_string().parse::<Filter>().unwrap(), filter);
        }
    }
}
