use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A realtime message: a JSON object with a `type` field and arbitrary
/// additional fields.
///
/// The additional fields are kept as a flattened [`Value`] so consumers can
/// dispatch on `kind` and pick payload fields without a fixed schema. When
/// constructing a message, `data` must be a JSON object (or empty) for the
/// message to serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub data: Value,
}

impl RealtimeMessage {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// The fixed keepalive message: `{"type":"ping"}`.
    pub fn ping() -> Self {
        Self::new("ping", Value::Object(Map::new()))
    }

    /// The fixed subscription message: `{"type":"subscribe","topics":[...]}`.
    pub fn subscribe(topics: &[String]) -> Self {
        Self::new("subscribe", json!({ "topics": topics }))
    }

    /// Looks up a payload field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}
