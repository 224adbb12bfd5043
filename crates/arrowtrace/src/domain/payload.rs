//! Schema-less span payloads
//!
//! The payload column stores each span as opaque JSON text. Decoding keeps the
//! whole object, including fields this crate never looks at, so that writing it
//! back out reproduces the original content.

use crate::schema::field_paths::payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a payload cell cannot become a [`SpanPayload`]
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Cell is null
    #[error("payload is null")]
    Null,

    /// Cell is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Cell is valid JSON but not an object
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// One decoded span: a JSON object with arbitrary nested content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanPayload(Map<String, Value>);

impl SpanPayload {
    /// Decodes a serialized span payload
    pub fn decode(text: &str) -> Result<Self, PayloadError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PayloadError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Decodes a nullable payload cell
    pub fn decode_cell(cell: Option<&str>) -> Result<Self, PayloadError> {
        cell.ok_or(PayloadError::Null).and_then(Self::decode)
    }

    /// Returns the raw field value for a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a field as a string slice if it is a JSON string
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.str_field(payload::TRACE_ID)
    }

    pub fn span_id(&self) -> Option<&str> {
        self.str_field(payload::SPAN_ID)
    }

    pub fn parent_span_id(&self) -> Option<&str> {
        self.str_field(payload::PARENT_SPAN_ID)
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field(payload::NAME)
    }

    /// Returns the span kind as text, whether it was written as a string or a number
    pub fn kind(&self) -> Option<String> {
        match self.0.get(payload::KIND)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Number of entries in the `attributes` list
    pub fn attribute_count(&self) -> usize {
        self.list_len(payload::ATTRIBUTES)
    }

    /// Number of entries in the `events` list
    pub fn event_count(&self) -> usize {
        self.list_len(payload::EVENTS)
    }

    fn list_len(&self, key: &str) -> usize {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for SpanPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
