//! Trace and resource reconstruction
//!
//! Rebuilds the OTLP `resourceSpans → scopeSpans → spans` tree from a flat span
//! table. Rows are grouped by `trace_id` in order of first appearance, each
//! trace is assigned the first `service_name` seen for it, and traces are then
//! partitioned into one resource group per service. Payloads are copied into
//! the output unchanged.

use crate::domain::{ResourceSpans, SpanPayload, TracesDocument};
use crate::error::{ArrowTraceError, Result};
use crate::iter::RowView;
use crate::options::{DecodePolicy, ReconstructOptions};
use crate::reader::SpanTable;
use crate::schema::{field_paths, validate_columns, ColumnKind, ColumnRequirement};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Counts describing one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConversionSummary {
    pub total_traces: usize,
    pub total_spans: usize,
    pub resource_groups: usize,
    pub skipped_rows: usize,
}

/// Output of [`reconstruct`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub document: TracesDocument,
    pub summary: ConversionSummary,
}

/// Decoded spans of one trace, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSpans {
    pub trace_id: String,
    pub spans: Vec<SpanPayload>,
}

/// Decoded payloads grouped by trace id, in order of first appearance
#[derive(Debug, Clone, Default)]
pub struct TraceGroups {
    traces: Vec<TraceSpans>,
    index: HashMap<String, usize>,
    services: HashMap<String, String>,
    skipped_rows: usize,
}

impl TraceGroups {
    /// Number of traces with at least one decoded span
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TraceSpans> {
        self.traces.iter()
    }

    pub fn get(&self, trace_id: &str) -> Option<&TraceSpans> {
        self.index.get(trace_id).map(|&i| &self.traces[i])
    }

    /// Service assigned to a trace (the first one seen for it)
    pub fn service_of(&self, trace_id: &str) -> Option<&str> {
        self.services.get(trace_id).map(String::as_str)
    }

    pub fn total_spans(&self) -> usize {
        self.traces.iter().map(|t| t.spans.len()).sum()
    }

    /// Rows dropped under [`DecodePolicy::Skip`]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    fn record_service(&mut self, trace_id: &str, service_name: &str) {
        if !self.services.contains_key(trace_id) {
            self.services
                .insert(trace_id.to_string(), service_name.to_string());
        }
    }

    fn push_span(&mut self, trace_id: &str, span: SpanPayload) {
        let slot = match self.index.get(trace_id) {
            Some(&slot) => slot,
            None => {
                self.index.insert(trace_id.to_string(), self.traces.len());
                self.traces.push(TraceSpans {
                    trace_id: trace_id.to_string(),
                    spans: Vec::new(),
                });
                self.traces.len() - 1
            }
        };
        self.traces[slot].spans.push(span);
    }

    /// Partitions traces into one resource group per service
    ///
    /// Groups appear in the order their first trace was seen; within a group,
    /// traces keep their order and each trace's spans stay in row order.
    pub fn into_document(self, default_service_name: &str) -> TracesDocument {
        let TraceGroups {
            traces, services, ..
        } = self;

        let mut groups: Vec<(String, Vec<SpanPayload>)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();

        for trace in traces {
            let service = services
                .get(&trace.trace_id)
                .map(String::as_str)
                .unwrap_or(default_service_name);

            let slot = match group_index.get(service) {
                Some(&slot) => slot,
                None => {
                    group_index.insert(service.to_string(), groups.len());
                    groups.push((service.to_string(), Vec::new()));
                    groups.len() - 1
                }
            };
            groups[slot].1.extend(trace.spans);
        }

        TracesDocument {
            resource_spans: groups
                .into_iter()
                .map(|(service, spans)| ResourceSpans::for_service(service, spans))
                .collect(),
        }
    }
}

/// Rebuilds the OTLP export tree from a span table
pub fn reconstruct(table: &SpanTable, options: &ReconstructOptions) -> Result<Reconstruction> {
    let groups = group_by_trace(table, options)?;

    let total_traces = groups.len();
    let total_spans = groups.total_spans();
    let skipped_rows = groups.skipped_rows();
    let document = groups.into_document(&options.default_service_name);

    let summary = ConversionSummary {
        total_traces,
        total_spans,
        resource_groups: document.resource_spans.len(),
        skipped_rows,
    };
    info!(
        "Reconstructed {} spans from {} traces into {} resource groups ({} rows skipped)",
        summary.total_spans, summary.total_traces, summary.resource_groups, summary.skipped_rows
    );

    Ok(Reconstruction { document, summary })
}

/// Decodes every payload and groups them by trace id
pub fn group_by_trace(table: &SpanTable, options: &ReconstructOptions) -> Result<TraceGroups> {
    let payload_column = options.payload_column(table)?;
    validate_columns(
        table.schema(),
        &[
            ColumnRequirement::required(field_paths::TRACE_ID, ColumnKind::String),
            ColumnRequirement::optional(field_paths::SERVICE_NAME, ColumnKind::String),
            ColumnRequirement::required(payload_column, ColumnKind::String),
        ],
    )?;
    debug!(
        "Grouping {} rows by trace using payload column {}",
        table.num_rows(),
        payload_column
    );

    let mut groups = TraceGroups::default();
    for row in table.rows() {
        let trace_id = row.str(field_paths::TRACE_ID)?.unwrap_or_default();
        let service_name = options.service_name(row.str_or_none(field_paths::SERVICE_NAME)?);
        groups.record_service(trace_id, service_name);

        match decode_with_policy(&row, payload_column, options.decode_policy)? {
            Some(span) => groups.push_span(trace_id, span),
            None => groups.skipped_rows += 1,
        }
    }

    Ok(groups)
}

/// Decodes every payload in row order
pub fn payloads(table: &SpanTable, options: &ReconstructOptions) -> Result<Vec<SpanPayload>> {
    let payload_column = options.payload_column(table)?;
    validate_columns(
        table.schema(),
        &[ColumnRequirement::required(payload_column, ColumnKind::String)],
    )?;

    let mut spans = Vec::with_capacity(table.num_rows());
    for row in table.rows() {
        if let Some(span) = decode_with_policy(&row, payload_column, options.decode_policy)? {
            spans.push(span);
        }
    }
    Ok(spans)
}

/// Decodes one row's payload, mapping failures to a row-scoped error
pub(crate) fn decode_row(row: &RowView<'_>, payload_column: &str) -> Result<SpanPayload> {
    let cell = row.str(payload_column)?;
    SpanPayload::decode_cell(cell).map_err(|e| ArrowTraceError::payload_decode(row.index(), e))
}

/// Decodes one row's payload; `Ok(None)` means the row was skipped
pub(crate) fn decode_with_policy(
    row: &RowView<'_>,
    payload_column: &str,
    policy: DecodePolicy,
) -> Result<Option<SpanPayload>> {
    match decode_row(row, payload_column) {
        Ok(span) => Ok(Some(span)),
        Err(e @ ArrowTraceError::PayloadDecode { .. }) if policy == DecodePolicy::Skip => {
            warn!("Skipping span row: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
