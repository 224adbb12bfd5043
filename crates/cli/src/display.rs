use anyhow::{Context, Result};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrowtrace::{ConversionSummary, SpanPayload, SpanTable, TraceGroups, TraceStatistics};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::DynamicFullWidth);
    table
}

/// Formats the column names and Arrow types of a span table
pub fn format_schema(table: &SpanTable) -> String {
    let mut out = new_table();
    out.set_header(vec![Cell::new("column"), Cell::new("type"), Cell::new("nullable")]);
    for field in table.schema().fields() {
        out.add_row(vec![
            Cell::new(field.name()),
            Cell::new(field.data_type()),
            Cell::new(field.is_nullable()),
        ]);
    }
    out.to_string()
}

/// Formats the first `limit` rows of a span table
pub fn format_rows(table: &SpanTable, limit: usize) -> Result<String> {
    let options = FormatOptions::default().with_null("NULL");
    let head = table.slice(0, limit);

    let columns = table.column_names();
    let mut out = new_table();
    out.set_header(columns.iter().map(Cell::new).collect::<Vec<_>>());

    for batch in head.batches() {
        // Batches from different files may order their columns differently
        let mut formatters = Vec::with_capacity(columns.len());
        for name in &columns {
            let column = batch
                .column_by_name(name)
                .with_context(|| format!("Column {} missing from batch", name))?;
            formatters.push(ArrayFormatter::try_new(column.as_ref(), &options)?);
        }

        for row_idx in 0..batch.num_rows() {
            let row: Vec<Cell> = formatters
                .iter()
                .map(|f| Cell::new(f.value(row_idx).to_string()))
                .collect();
            out.add_row(row);
        }
    }

    Ok(out.to_string())
}

/// Lists the first `trace_limit` traces with up to `name_limit` span names each
pub fn format_trace_preview(groups: &TraceGroups, trace_limit: usize, name_limit: usize) -> String {
    let mut lines = Vec::new();
    for trace in groups.iter().take(trace_limit) {
        let mut names: Vec<&str> = trace
            .spans
            .iter()
            .take(name_limit)
            .map(|s| s.name().unwrap_or("-"))
            .collect();
        let hidden = trace.spans.len().saturating_sub(name_limit);
        let more = format!("... and {} more", hidden);
        if hidden > 0 {
            names.push(&more);
        }
        lines.push(format!(
            "  {}: {} spans [{}]",
            trace.trace_id,
            trace.spans.len(),
            names.join(", ")
        ));
    }

    let hidden_traces = groups.len().saturating_sub(trace_limit);
    if hidden_traces > 0 {
        lines.push(format!("  ... and {} more traces", hidden_traces));
    }
    lines.join("\n")
}

pub fn format_statistics(stats: &TraceStatistics) -> String {
    let mut out = new_table();
    out.set_header(vec![Cell::new("metric"), Cell::new("value")]);
    out.add_row(vec![Cell::new("total spans"), Cell::new(stats.total_spans)]);
    out.add_row(vec![Cell::new("unique traces"), Cell::new(stats.unique_traces)]);
    out.add_row(vec![Cell::new("unique services"), Cell::new(stats.unique_services)]);
    out.add_row(vec![
        Cell::new("avg duration (ms)"),
        Cell::new(format!("{:.2}", stats.avg_duration_ms)),
    ]);
    out.add_row(vec![
        Cell::new("total duration (s)"),
        Cell::new(format!("{:.2}", stats.total_duration_seconds)),
    ]);

    let mut kinds = new_table();
    kinds.set_header(vec![Cell::new("kind"), Cell::new("count")]);
    for kind in &stats.span_kinds {
        kinds.add_row(vec![Cell::new(&kind.kind), Cell::new(kind.count)]);
    }

    format!("{}\n{}", out, kinds)
}

pub fn format_summary(summary: &ConversionSummary) -> String {
    let mut out = new_table();
    out.set_header(vec![
        Cell::new("traces"),
        Cell::new("spans"),
        Cell::new("resource groups"),
        Cell::new("skipped rows"),
    ]);
    out.add_row(vec![
        Cell::new(summary.total_traces),
        Cell::new(summary.total_spans),
        Cell::new(summary.resource_groups),
        Cell::new(summary.skipped_rows),
    ]);
    out.to_string()
}

/// Formats the identifying fields of one decoded span
pub fn format_span_structure(span: &SpanPayload) -> String {
    let mut out = new_table();
    out.set_header(vec![Cell::new("field"), Cell::new("value")]);
    let missing = || "-".to_string();
    out.add_row(vec![
        Cell::new("traceId"),
        Cell::new(span.trace_id().map(str::to_string).unwrap_or_else(missing)),
    ]);
    out.add_row(vec![
        Cell::new("spanId"),
        Cell::new(span.span_id().map(str::to_string).unwrap_or_else(missing)),
    ]);
    out.add_row(vec![
        Cell::new("name"),
        Cell::new(span.name().map(str::to_string).unwrap_or_else(missing)),
    ]);
    out.add_row(vec![
        Cell::new("kind"),
        Cell::new(span.kind().unwrap_or_else(missing)),
    ]);
    out.add_row(vec![Cell::new("attributes"), Cell::new(span.attribute_count())]);
    out.add_row(vec![Cell::new("events"), Cell::new(span.event_count())]);
    out.to_string()
}
