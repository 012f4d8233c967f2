//! Inherent and residual risk observations as delivered by the backend
//!
//! Field names follow the backend payloads. Levels are kept as raw JSON
//! values and normalized on access, so a malformed level never fails the
//! whole collection.

use crate::labels::DEFAULT_PLACEHOLDER_NAME;
use crate::normalize::{normalize_field, LevelIndex};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::path::Path;

/// Opaque backend identifier (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(from = "Value")]
pub struct EventId(pub String);

impl From<Value> for EventId {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => EventId(s.trim().to_string()),
            // 101 and 101.0 name the same event
            Value::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                    EventId((f as i64).to_string())
                }
                _ => EventId(n.to_string()),
            },
            other => EventId(other.to_string()),
        }
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<i64> for EventId {
    fn from(n: i64) -> Self {
        EventId(n.to_string())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Risk event before any control is considered
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InherentObservation {
    #[serde(default, alias = "id", alias = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub probability_id: Option<Value>,
    #[serde(default)]
    pub impact_id: Option<Value>,
}

impl InherentObservation {
    pub fn new(description: &str, probability_level: i64, impact_level: i64) -> Self {
        InherentObservation {
            event_id: None,
            description: Some(description.to_string()),
            probability_id: Some(Value::from(probability_level)),
            impact_id: Some(Value::from(impact_level)),
        }
    }

    pub fn with_event_id(mut self, id: impl Into<EventId>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    /// Description with surrounding whitespace removed, if non-empty
    pub fn name(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Accept any scalar as text; arrays, objects and null read as absent
fn lenient_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Risk level re-evaluated after applying a control
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResidualObservation {
    #[serde(default, alias = "eventLogId", skip_serializing_if = "Option::is_none")]
    pub eventlog_id: Option<EventId>,
    #[serde(default)]
    pub n_probability: Option<Value>,
    #[serde(default)]
    pub n_impact: Option<Value>,
}

impl ResidualObservation {
    pub fn new(probability_level: i64, impact_level: i64) -> Self {
        ResidualObservation {
            eventlog_id: None,
            n_probability: Some(Value::from(probability_level)),
            n_impact: Some(Value::from(impact_level)),
        }
    }

    pub fn with_eventlog_id(mut self, id: impl Into<EventId>) -> Self {
        self.eventlog_id = Some(id.into());
        self
    }
}

/// Anything that can be placed on the probability x impact grid
pub trait MatrixPoint {
    fn probability(&self) -> LevelIndex;
    fn impact(&self) -> LevelIndex;
    /// Text shown for this point in heat-map tooltips
    fn label(&self) -> String;
}

impl MatrixPoint for InherentObservation {
    fn probability(&self) -> LevelIndex {
        normalize_field(self.probability_id.as_ref())
    }

    fn impact(&self) -> LevelIndex {
        normalize_field(self.impact_id.as_ref())
    }

    fn label(&self) -> String {
        self.name().unwrap_or(DEFAULT_PLACEHOLDER_NAME).to_string()
    }
}

impl MatrixPoint for ResidualObservation {
    fn probability(&self) -> LevelIndex {
        normalize_field(self.n_probability.as_ref())
    }

    fn impact(&self) -> LevelIndex {
        normalize_field(self.n_impact.as_ref())
    }

    fn label(&self) -> String {
        match &self.eventlog_id {
            Some(id) => format!("event {}", id),
            None => "<sin evento>".to_string(),
        }
    }
}

/// Parse a collection: either a bare JSON array or an object with a `data` array.
///
/// A malformed entry (null, a scalar, a field of the wrong shape) becomes an
/// empty record at the same position, so it is listed as unassessed and
/// positional pairing is preserved.
pub fn parse_records<T: DeserializeOwned + Default>(content: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(content).context("failed to parse JSON")?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => anyhow::bail!("expected a JSON array or an object with a \"data\" array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a \"data\" array"),
    };
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(position, item)| decode_record(position, item))
        .collect())
}

fn decode_record<T: DeserializeOwned + Default>(position: usize, item: Value) -> T {
    match serde_json::from_value(item) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(position, error = %err, "malformed record kept as unassessed");
            T::default()
        }
    }
}

fn load_records<T: DeserializeOwned + Default>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read observations: {}", path.display()))?;
    parse_records(&content).with_context(|| format!("invalid observations in: {}", path.display()))
}

/// Load inherent observations from a JSON file
pub fn load_inherent(path: &Path) -> Result<Vec<InherentObservation>> {
    load_records(path)
}

/// Load residual observations from a JSON file
pub fn load_residual(path: &Path) -> Result<Vec<ResidualObservation>> {
    load_records(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_inherent() {
        let json = r#"[
            {"id": 7, "description": "Fraude", "probability_id": 3, "impact_id": 4, "extra": "x"},
            {"description": "Sin nivel", "probability_id": null}
        ]"#;
        let records: Vec<InherentObservation> = parse_records(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id, Some(EventId::from(7i64)));
        assert_eq!(records[0].probability(), LevelIndex::Valid(2));
        assert_eq!(records[0].impact(), LevelIndex::Valid(3));
        assert_eq!(records[1].probability(), LevelIndex::Invalid);
        assert_eq!(records[1].impact(), LevelIndex::Invalid);
    }

    #[test]
    fn test_parse_data_envelope() {
        let json = r#"{"data": [{"eventlog_id": "ab-1", "n_probability": "2", "n_impact": 5}]}"#;
        let records: Vec<ResidualObservation> = parse_records(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].eventlog_id, Some(EventId::from("ab-1")));
        assert_eq!(records[0].probability(), LevelIndex::Valid(1));
        assert_eq!(records[0].impact(), LevelIndex::Valid(4));
    }

    #[test]
    fn test_parse_rejects_scalar() {
        assert!(parse_records::<InherentObservation>("42").is_err());
        assert!(parse_records::<InherentObservation>(r#"{"rows": []}"#).is_err());
    }

    #[test]
    fn test_labels() {
        let named = InherentObservation::new("  Fraude ", 1, 1);
        assert_eq!(named.label(), "Fraude");
        let unnamed = InherentObservation {
            description: Some("   ".to_string()),
            ..InherentObservation::new("", 1, 1).with_event_id(12i64)
        };
        assert_eq!(unnamed.label(), DEFAULT_PLACEHOLDER_NAME);
        assert_eq!(ResidualObservation::new(1, 1).label(), "<sin evento>");
    }

    #[test]
    fn test_integral_float_event_id_matches_integer() {
        assert_eq!(EventId::from(Value::from(101.0)), EventId::from(101i64));
        assert_eq!(EventId::from(Value::from(101)), EventId::from(101i64));
        assert_eq!(EventId::from(Value::from(" 101 ")), EventId::from(101i64));
        assert_eq!(EventId::from(Value::from(101.5)).0, "101.5");

        let json = r#"[{"eventlog_id": 101.0, "n_probability": 1, "n_impact": 1}]"#;
        let records: Vec<ResidualObservation> = parse_records(json).unwrap();
        assert_eq!(records[0].eventlog_id, Some(EventId::from(101i64)));
    }

    #[test]
    fn test_malformed_entries_degrade_in_place() {
        let json = r#"[
            {"description": "A", "probability_id": 2, "impact_id": 2},
            null,
            {"description": 42, "probability_id": 3, "impact_id": 3},
            {"description": ["x"], "probability_id": 1, "impact_id": 1},
            {"probability_id": 1, "impact_id": 1, "id": {"nested": true}},
            7
        ]"#;
        let records: Vec<InherentObservation> = parse_records(json).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[0].name(), Some("A"));

        assert_eq!(records[1], InherentObservation::default());
        assert_eq!(records[1].probability(), LevelIndex::Invalid);
        assert_eq!(records[1].label(), DEFAULT_PLACEHOLDER_NAME);

        assert_eq!(records[2].name(), Some("42"));
        assert_eq!(records[2].probability(), LevelIndex::Valid(2));

        assert_eq!(records[3].name(), None);
        assert_eq!(records[3].impact(), LevelIndex::Valid(0));

        assert_eq!(records[5], InherentObservation::default());
    }

    #[test]
    fn test_event_id_serializes_as_string() {
        let obs = ResidualObservation::new(1, 2).with_eventlog_id(5i64);
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["eventlog_id"], Value::from("5"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inherent.json");
        std::fs::write(&path, r#"[{"description": "A", "probability_id": 1, "impact_id": 1}]"#)
            .unwrap();
        let records = load_inherent(&path).unwrap();
        assert_eq!(records[0].name(), Some("A"));
        assert!(load_residual(&dir.path().join("missing.json")).is_err());
    }
}
