//! Per-trace training examples and span name extraction

use crate::error::Result;
use crate::options::ReconstructOptions;
use crate::reader::SpanTable;
use crate::schema::{field_paths, validate_columns, ColumnKind, ColumnRequirement};
use crate::stats::NANOS_PER_MILLI;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use tracing::debug;

/// One trace summarized as a training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub trace_id: String,
    /// Distinct services, first seen first
    pub service_names: Vec<String>,
    pub span_count: usize,
    /// Span names in row order
    pub span_names: Vec<String>,
    pub total_duration_ms: f64,
    /// Name of the first span whose parent is the root sentinel
    pub root_span: Option<String>,
}

#[derive(Default)]
struct ExampleBuilder {
    service_names: Vec<String>,
    span_names: Vec<String>,
    duration_ns: i128,
    root_span: Option<String>,
}

impl ExampleBuilder {
    fn finish(self, trace_id: String) -> TrainingExample {
        TrainingExample {
            trace_id,
            span_count: self.span_names.len(),
            service_names: self.service_names,
            span_names: self.span_names,
            total_duration_ms: self.duration_ns as f64 / NANOS_PER_MILLI,
            root_span: self.root_span,
        }
    }
}

/// Builds one training example per trace, ordered by ascending trace id
pub fn training_examples(
    table: &SpanTable,
    options: &ReconstructOptions,
) -> Result<Vec<TrainingExample>> {
    validate_columns(
        table.schema(),
        &[
            ColumnRequirement::required(field_paths::TRACE_ID, ColumnKind::String),
            ColumnRequirement::required(field_paths::NAME, ColumnKind::String),
            ColumnRequirement::required(field_paths::DURATION_NS, ColumnKind::Integer),
            ColumnRequirement::optional(field_paths::SERVICE_NAME, ColumnKind::String),
            ColumnRequirement::optional(field_paths::PARENT_SPAN_ID, ColumnKind::String),
        ],
    )?;

    let mut traces: BTreeMap<&str, ExampleBuilder> = BTreeMap::new();
    for row in table.rows() {
        let trace_id = row.str(field_paths::TRACE_ID)?.unwrap_or_default();
        let name = row.str(field_paths::NAME)?.unwrap_or_default();
        let service = options.service_name(row.str_or_none(field_paths::SERVICE_NAME)?);
        let parent = row.str_or_none(field_paths::PARENT_SPAN_ID)?;

        let builder = traces.entry(trace_id).or_default();
        if !builder.service_names.iter().any(|s| s == service) {
            builder.service_names.push(service.to_string());
        }
        builder.span_names.push(name.to_string());
        if let Some(duration) = row.int(field_paths::DURATION_NS)? {
            builder.duration_ns += duration as i128;
        }
        if builder.root_span.is_none() && options.is_root(parent) {
            builder.root_span = Some(name.to_string());
        }
    }

    debug!("Built {} training examples", traces.len());
    Ok(traces
        .into_iter()
        .map(|(trace_id, builder)| builder.finish(trace_id.to_string()))
        .collect())
}

/// Writes examples as newline-delimited JSON, returning the number of lines
pub fn write_jsonl<W: Write>(examples: &[TrainingExample], mut writer: W) -> Result<usize> {
    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(examples.len())
}

/// Distinct span names in first-seen order, at most `limit` of them
pub fn unique_span_names(table: &SpanTable, limit: usize) -> Result<Vec<String>> {
    validate_columns(
        table.schema(),
        &[ColumnRequirement::required(field_paths::NAME, ColumnKind::String)],
    )?;

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for row in table.rows() {
        if names.len() >= limit {
            break;
        }
        if let Some(name) = row.str(field_paths::NAME)? {
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
