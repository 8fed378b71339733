// Base Model - identity and timestamps shared by every entity
//
// "Identity persists, values change":
// - id is generated once and never reassigned
// - created_at is fixed at construction
// - updated_at moves forward on every persist

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire/disk format of every timestamp (naive UTC, microseconds)
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseModel {
    /// Stable identity (UUID v4) - NEVER changes
    pub id: String,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl BaseModel {
    /// Fresh identity, both timestamps set to the same "now"
    pub fn new() -> Self {
        let now = Utc::now();

        BaseModel {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh updated_at (called before every persist)
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Insert a fresh id and timestamps into a field mapping wherever they are
    /// missing or null. Fields the caller supplied are kept as-is.
    pub fn fill_defaults(fields: &mut Map<String, Value>) {
        let fresh = BaseModel::new();
        let created_at = timestamp::format(&fresh.created_at);

        fill_missing(fields, "id", Value::String(fresh.id));
        fill_missing(fields, "created_at", Value::String(created_at.clone()));
        fill_missing(fields, "updated_at", Value::String(created_at));
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_missing(fields: &mut Map<String, Value>, key: &str, value: Value) {
    if matches!(fields.get(key), None | Some(Value::Null)) {
        fields.insert(key.to_string(), value);
    }
}

/// serde adapter for TIME_FORMAT timestamps.
///
/// Parsing also accepts RFC 3339 so hand-edited documents still load.
pub mod timestamp {
    use super::*;
    use serde::{Deserializer, Serializer};

    const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(TIME_FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, PARSE_FORMAT) {
            return Some(naive.and_utc());
        }

        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
