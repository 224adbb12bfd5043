//! OTLP trace export tree
//!
//! Serializes to the standard OpenTelemetry JSON shape:
//! `{"resourceSpans": [{"resource": {...}, "scopeSpans": [{"spans": [...]}]}]}`.

use crate::domain::SpanPayload;
use serde::{Deserialize, Serialize};

/// Resource attribute key holding the owning service
pub const SERVICE_NAME_KEY: &str = "service.name";

/// Top-level export document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracesDocument {
    pub resource_spans: Vec<ResourceSpans>,
}

impl TracesDocument {
    /// Total number of spans across every resource group
    pub fn total_spans(&self) -> usize {
        self.resource_spans.iter().map(ResourceSpans::span_count).sum()
    }

    /// Iterates over every span in output order
    pub fn spans(&self) -> impl Iterator<Item = &SpanPayload> {
        self.resource_spans
            .iter()
            .flat_map(|rs| &rs.scope_spans)
            .flat_map(|ss| &ss.spans)
    }

    /// Finds the resource group for a service
    pub fn resource_for_service(&self, service_name: &str) -> Option<&ResourceSpans> {
        self.resource_spans
            .iter()
            .find(|rs| rs.service_name() == Some(service_name))
    }
}

/// Spans owned by one resource (service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    pub resource: Resource,
    pub scope_spans: Vec<ScopeSpans>,
}

impl ResourceSpans {
    /// Builds a resource group with a `service.name` attribute and a single scope
    pub fn for_service(service_name: impl Into<String>, spans: Vec<SpanPayload>) -> Self {
        Self {
            resource: Resource {
                attributes: vec![KeyValue::string(SERVICE_NAME_KEY, service_name)],
            },
            scope_spans: vec![ScopeSpans { spans }],
        }
    }

    /// Returns the `service.name` resource attribute, if present
    pub fn service_name(&self) -> Option<&str> {
        self.resource
            .attributes
            .iter()
            .find(|kv| kv.key == SERVICE_NAME_KEY)
            .map(|kv| kv.value.string_value.as_str())
    }

    pub fn span_count(&self) -> usize {
        self.scope_spans.iter().map(|ss| ss.spans.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: value.into(),
            },
        }
    }
}

/// Attribute value; resource attributes written here are always strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeSpans {
    pub spans: Vec<SpanPayload>,
}
