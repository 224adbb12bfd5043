use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::ipc::writer::{FileWriter, IpcWriteOptions, StreamWriter};
use arrow::ipc::CompressionType;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One span row as written by the batch exporter
#[derive(Debug, Clone)]
pub struct SpanRow {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: String,
    pub service_name: Option<String>,
    pub name: String,
    pub kind: String,
    pub duration_ns: i64,
    pub otlp_span: String,
}

impl SpanRow {
    /// Builds a row whose payload mirrors its flat columns
    pub fn new(trace_id: &str, span_id: &str, parent_span_id: &str, service_name: &str) -> Self {
        let name = format!("op-{}", span_id);
        Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            parent_span_id: parent_span_id.to_string(),
            service_name: Some(service_name.to_string()),
            otlp_span: span_json(trace_id, span_id, parent_span_id, &name),
            name,
            kind: "SPAN_KIND_INTERNAL".to_string(),
            duration_ns: 1_000_000,
        }
    }

    pub fn without_service(mut self) -> Self {
        self.service_name = None;
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_duration(mut self, duration_ns: i64) -> Self {
        self.duration_ns = duration_ns;
        self
    }

    pub fn with_payload(mut self, otlp_span: impl Into<String>) -> Self {
        self.otlp_span = otlp_span.into();
        self
    }
}

/// OTLP span JSON with attributes and events, in the exporter's camelCase form
pub fn span_json(trace_id: &str, span_id: &str, parent_span_id: &str, name: &str) -> String {
    serde_json::json!({
        "traceId": trace_id,
        "spanId": span_id,
        "parentSpanId": parent_span_id,
        "name": name,
        "kind": 1,
        "startTimeUnixNano": "1700000000000000000",
        "endTimeUnixNano": "1700000000001000000",
        "attributes": [
            {"key": "http.method", "value": {"stringValue": "GET"}},
            {"key": "http.status_code", "value": {"intValue": "200"}}
        ],
        "events": [
            {"timeUnixNano": "1700000000000500000", "name": "cache.miss"}
        ],
        "status": {}
    })
    .to_string()
}

/// Schema of a span batch file with every column present
pub fn span_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("trace_id", DataType::Utf8, false),
        Field::new("span_id", DataType::Utf8, false),
        Field::new("parent_span_id", DataType::Utf8, false),
        Field::new("service_name", DataType::Utf8, true),
        Field::new("name", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("duration_ns", DataType::Int64, false),
        Field::new("otlp_span", DataType::Utf8, false),
    ]))
}

/// Builds one record batch from span rows
pub fn span_batch(rows: &[SpanRow]) -> anyhow::Result<RecordBatch> {
    let strings = |f: fn(&SpanRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let batch = RecordBatch::try_new(
        span_schema(),
        vec![
            strings(|r| r.trace_id.as_str()),
            strings(|r| r.span_id.as_str()),
            strings(|r| r.parent_span_id.as_str()),
            Arc::new(StringArray::from(
                rows.iter()
                    .map(|r| r.service_name.as_deref())
                    .collect::<Vec<_>>(),
            )),
            strings(|r| r.name.as_str()),
            strings(|r| r.kind.as_str()),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.duration_ns).collect::<Vec<_>>(),
            )),
            strings(|r| r.otlp_span.as_str()),
        ],
    )?;
    Ok(batch)
}

/// Writes rows as an Arrow IPC file, `rows_per_batch` rows per record batch
pub fn write_span_file(
    path: &Path,
    rows: &[SpanRow],
    rows_per_batch: usize,
    compression: Option<CompressionType>,
) -> anyhow::Result<()> {
    let options = IpcWriteOptions::default().try_with_compression(compression)?;
    let mut writer =
        FileWriter::try_new_with_options(File::create(path)?, &span_schema(), options)?;
    for chunk in rows.chunks(rows_per_batch.max(1)) {
        writer.write(&span_batch(chunk)?)?;
    }
    writer.finish()?;
    Ok(())
}

/// Writes rows as an Arrow IPC stream in a single record batch
pub fn write_span_stream(path: &Path, rows: &[SpanRow]) -> anyhow::Result<()> {
    let mut writer = StreamWriter::try_new(File::create(path)?, &span_schema())?;
    writer.write(&span_batch(rows)?)?;
    writer.finish()?;
    Ok(())
}

/// Three labeled traces and one unlabeled trace, split into two files
pub fn sample_rows() -> (Vec<SpanRow>, Vec<SpanRow>) {
    let first = vec![
        SpanRow::new("t1", "s0", "", "frontend").with_kind("SPAN_KIND_SERVER"),
        SpanRow::new("t1", "s1", "s0", "frontend").with_duration(2_000_000),
        SpanRow::new("t2", "s2", "", "backend").with_kind("SPAN_KIND_SERVER"),
        SpanRow::new("t1", "s3", "s1", "backend").with_kind("SPAN_KIND_CLIENT"),
    ];
    let second = vec![
        SpanRow::new("t3", "s4", "", "frontend").with_duration(4_000_000),
        SpanRow::new("t2", "s5", "s2", "backend"),
        SpanRow::new("t4", "s6", "", "batch").without_service(),
    ];
    (first, second)
}

/// Directory of JSON span payload fixtures
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/spans")
}
