//! Table statistics computed from the flat columns only
//!
//! Nested payloads are never decoded here.

use crate::error::{ArrowTraceError, Result};
use crate::options::ReconstructOptions;
use crate::reader::SpanTable;
use crate::schema::{field_paths, validate_columns, ColumnKind, ColumnRequirement};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const NANOS_PER_MILLI: f64 = 1_000_000.0;
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Occurrences of one span kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCount {
    pub kind: String,
    pub count: usize,
}

/// Aggregates over a span table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStatistics {
    pub total_spans: usize,
    pub unique_traces: usize,
    pub unique_services: usize,
    /// Ordered by descending count, ties by first appearance
    pub span_kinds: Vec<KindCount>,
    /// Mean over rows with a non-null duration
    pub avg_duration_ms: f64,
    pub total_duration_seconds: f64,
}

/// Computes row, trace, service and kind counts plus duration aggregates
pub fn compute_statistics(
    table: &SpanTable,
    options: &ReconstructOptions,
) -> Result<TraceStatistics> {
    if table.is_empty() {
        return Err(ArrowTraceError::EmptyTable);
    }
    validate_columns(
        table.schema(),
        &[
            ColumnRequirement::required(field_paths::TRACE_ID, ColumnKind::String),
            ColumnRequirement::optional(field_paths::SERVICE_NAME, ColumnKind::String),
            ColumnRequirement::required(field_paths::KIND, ColumnKind::Text),
            ColumnRequirement::required(field_paths::DURATION_NS, ColumnKind::Integer),
        ],
    )?;

    let mut traces: HashSet<&str> = HashSet::new();
    let mut services: HashSet<&str> = HashSet::new();
    let mut kinds: Vec<KindCount> = Vec::new();
    let mut kind_index: HashMap<String, usize> = HashMap::new();
    let mut duration_sum: i128 = 0;
    let mut duration_rows: usize = 0;

    for row in table.rows() {
        traces.insert(row.str(field_paths::TRACE_ID)?.unwrap_or_default());
        services.insert(options.service_name(row.str_or_none(field_paths::SERVICE_NAME)?));

        if let Some(kind) = row.text(field_paths::KIND)? {
            match kind_index.get(kind.as_ref()) {
                Some(&slot) => kinds[slot].count += 1,
                None => {
                    kind_index.insert(kind.to_string(), kinds.len());
                    kinds.push(KindCount {
                        kind: kind.into_owned(),
                        count: 1,
                    });
                }
            }
        }

        if let Some(duration) = row.int(field_paths::DURATION_NS)? {
            duration_sum += duration as i128;
            duration_rows += 1;
        }
    }

    // Stable sort keeps first-appearance order among equal counts
    kinds.sort_by(|a, b| b.count.cmp(&a.count));

    let avg_duration_ms = if duration_rows == 0 {
        0.0
    } else {
        duration_sum as f64 / duration_rows as f64 / NANOS_PER_MILLI
    };

    let stats = TraceStatistics {
        total_spans: table.num_rows(),
        unique_traces: traces.len(),
        unique_services: services.len(),
        span_kinds: kinds,
        avg_duration_ms,
        total_duration_seconds: duration_sum as f64 / NANOS_PER_SECOND,
    };
    debug!(
        "Computed statistics over {} spans in {} traces",
        stats.total_spans, stats.unique_traces
    );
    Ok(stats)
}
