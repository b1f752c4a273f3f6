//! Job response payloads.

use serde_json::{Map, Value, json};

/// Key under which find responses carry element ids.
pub const ELEMENT_KEY: &str = "ELEMENT";

/// Payload produced by a job and serialised as the HTTP response body.
#[derive(Debug, Clone, PartialEq)]
pub enum JobResponse {
    /// Opaque string payload, serialised as a JSON string.
    Text(String),
    /// Named fields.
    Object(Map<String, Value>),
    /// Multi-result queries.
    Array(Vec<Value>),
    /// Execution failed.
    Error { kind: String, message: String },
    /// No job ran; serialised as `{}`.
    Empty,
}

impl JobResponse {
    /// Failure payload, serialised as `{"error": kind, "message": message}`.
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// `{"ELEMENT": id}`.
    #[must_use]
    pub fn element(id: impl Into<String>) -> Self {
        Self::Object(element_object(id.into()))
    }

    /// `[{"ELEMENT": id}, ...]` in match order.
    #[must_use]
    pub fn elements(ids: Vec<String>) -> Self {
        Self::Array(
            ids.into_iter()
                .map(|id| Value::Object(element_object(id)))
                .collect(),
        )
    }

    /// Builds an object response from any serialisable struct.
    ///
    /// Values that do not serialise to a JSON object are wrapped under
    /// `value`.
    pub fn from_serialize(value: &impl serde::Serialize) -> Result<Self, serde_json::Error> {
        Ok(match serde_json::to_value(value)? {
            Value::Object(object) => Self::Object(object),
            other => {
                let mut object = Map::new();
                object.insert("value".to_owned(), other);
                Self::Object(object)
            }
        })
    }

    /// True for [`JobResponse::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// JSON value written to the client.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Object(object) => Value::Object(object.clone()),
            Self::Array(items) => Value::Array(items.clone()),
            Self::Error { kind, message } => json!({ "error": kind, "message": message }),
            Self::Empty => Value::Object(Map::new()),
        }
    }

    /// Serialised response body.
    #[must_use]
    pub fn to_body(&self) -> String {
        self.to_json().to_string()
    }
}

fn element_object(id: String) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(ELEMENT_KEY.to_owned(), Value::String(id));
    object
}
