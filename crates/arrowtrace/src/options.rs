//! Defaults and options shared by reconstruction, streaming and training export

use crate::error::{ArrowTraceError, Result};
use crate::reader::SpanTable;
use crate::schema::field_paths;
use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

/// Service label for rows without a service name
pub const DEFAULT_SERVICE_NAME: &str = "unknown";

/// `parent_span_id` value that marks the root span of a trace
pub const ROOT_PARENT_SENTINEL: &str = "";

/// Payload columns tried in order
pub const DEFAULT_PAYLOAD_COLUMNS: [&str; 2] = [field_paths::OTLP_SPAN, field_paths::ATTRIBUTES_JSON];

/// Number of payloads per streamed batch
pub const DEFAULT_STREAM_BATCH_SIZE: usize = 32;

/// What to do with a row whose payload cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Fail the whole call
    #[default]
    Abort,
    /// Drop the row, log a warning and count it
    Skip,
}

/// Options for turning span rows into decoded payloads
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructOptions {
    pub default_service_name: String,
    pub root_parent_sentinel: String,
    pub payload_columns: Vec<String>,
    pub decode_policy: DecodePolicy,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            default_service_name: DEFAULT_SERVICE_NAME.to_string(),
            root_parent_sentinel: ROOT_PARENT_SENTINEL.to_string(),
            payload_columns: DEFAULT_PAYLOAD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            decode_policy: DecodePolicy::default(),
        }
    }
}

impl ReconstructOptions {
    /// Same options with a different decode policy
    pub fn with_decode_policy(mut self, decode_policy: DecodePolicy) -> Self {
        self.decode_policy = decode_policy;
        self
    }

    /// Resolves the service label for a nullable `service_name` cell
    pub fn service_name<'a>(&'a self, cell: Option<&'a str>) -> &'a str {
        cell.unwrap_or(&self.default_service_name)
    }

    pub fn is_root(&self, parent_span_id: Option<&str>) -> bool {
        parent_span_id == Some(self.root_parent_sentinel.as_str())
    }

    /// Picks the first configured payload column present in the table
    pub fn payload_column(&self, table: &SpanTable) -> Result<&str> {
        self.payload_column_in(table.schema())
    }

    pub(crate) fn payload_column_in(&self, schema: &Schema) -> Result<&str> {
        self.payload_columns
            .iter()
            .find(|name| schema.column_with_name(name).is_some())
            .map(String::as_str)
            .ok_or_else(|| ArrowTraceError::MissingColumn(self.payload_columns.join(" | ")))
    }
}
