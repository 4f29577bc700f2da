//! Resource models exchanged with the media library REST API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Series identifier as assigned by the server
pub type SeriesId = u64;

// ========================================
// Series
// ========================================

/// Airing status of a series
///
/// The server sends free-form strings; `"Active"` and `"Ended"` are matched
/// case-insensitively and anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SeriesStatus {
    Active,
    Ended,
    Other(String),
}

impl Default for SeriesStatus {
    fn default() -> Self {
        SeriesStatus::Other(String::new())
    }
}

impl From<String> for SeriesStatus {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("active") {
            SeriesStatus::Active
        } else if raw.eq_ignore_ascii_case("ended") {
            SeriesStatus::Ended
        } else {
            SeriesStatus::Other(raw)
        }
    }
}

impl From<SeriesStatus> for String {
    fn from(status: SeriesStatus) -> Self {
        match status {
            SeriesStatus::Active => "Active".to_string(),
            SeriesStatus::Ended => "Ended".to_string(),
            SeriesStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for SeriesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesStatus::Active => write!(f, "Active"),
            SeriesStatus::Ended => write!(f, "Ended"),
            SeriesStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A series record
///
/// Fields the client does not interpret are carried in `extra` so a record
/// can be displayed and re-sent without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: SeriesId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: SeriesStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Series {
    pub fn new(id: SeriesId, title: impl Into<String>, status: SeriesStatus) -> Self {
        Self {
            id,
            title: title.into(),
            status,
            extra: Map::new(),
        }
    }
}

/// Request body for adding a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSeries {
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of the recently viewed series list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSeries {
    pub id: SeriesId,
    #[serde(default)]
    pub title: String,
}

impl From<&Series> for RecentSeries {
    fn from(series: &Series) -> Self {
        Self {
            id: series.id,
            title: series.title.clone(),
        }
    }
}

// ========================================
// User / Config
// ========================================

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server configuration, mirrored verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot(pub Map<String, Value>);

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// ========================================
// Failure
// ========================================

/// Error shape reported by the server and kept in each store's error slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub error: String,
    #[serde(default)]
    pub stack: Option<String>,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stack: None,
        }
    }

    pub fn with_stack(error: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stack: Some(stack.into()),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_is_case_insensitive() {
        let parsed: Vec<SeriesStatus> =
            serde_json::from_value(json!(["ended", "ACTIVE", "Continuing", "Ended"])).unwrap();
        assert_eq!(
            parsed,
            vec![
                SeriesStatus::Ended,
                SeriesStatus::Active,
                SeriesStatus::Other("Continuing".to_string()),
                SeriesStatus::Ended,
            ]
        );
    }

    #[test]
    fn test_series_keeps_unknown_fields() {
        let series: Series = serde_json::from_value(json!({
            "id": 7,
            "title": "Northern Lights",
            "status": "Ended",
            "network": "NRK",
        }))
        .unwrap();

        assert_eq!(series.id, 7);
        assert_eq!(series.status, SeriesStatus::Ended);
        assert_eq!(series.extra.get("network"), Some(&json!("NRK")));

        let back = serde_json::to_value(&series).unwrap();
        assert_eq!(back["network"], "NRK");
        assert_eq!(back["status"], "Ended");
    }

    #[test]
    fn test_series_minimal_record() {
        let series: Series = serde_json::from_value(json!({"id": 2})).unwrap();
        assert_eq!(series.title, "");
        assert_eq!(series.status, SeriesStatus::default());
    }

    #[test]
    fn test_failure_without_stack() {
        let failure: Failure = serde_json::from_value(json!({"error": "boom"})).unwrap();
        assert_eq!(failure, Failure::new("boom"));
        assert_eq!(failure.to_string(), "boom");
    }
}
