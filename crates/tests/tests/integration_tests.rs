use arrow::ipc::CompressionType;
use arrowtrace::{
    compute_statistics, payloads, reconstruct, stream_batches, stream_windows, to_otlp_json_string,
    training_examples, ArrowTraceError, DecodePolicy, ReconstructOptions, SpanPayload, SpanTable,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use test_each_file::test_each_file;
use tests::{sample_rows, span_batch, span_schema, write_span_file, write_span_stream, SpanRow};

/// Writes the two sample files into `dir` and returns the glob matching both
fn write_sample_files(dir: &Path) -> String {
    let (first, second) = sample_rows();
    write_span_file(&dir.join("spans.batch_0000.arrow"), &first, 2, None).unwrap();
    write_span_file(&dir.join("spans.batch_0001.arrow"), &second, 2, None).unwrap();
    format!("{}/spans.batch_*.arrow", dir.display())
}

fn span_ids<'a>(spans: impl IntoIterator<Item = &'a SpanPayload>) -> Vec<String> {
    spans
        .into_iter()
        .map(|s| s.span_id().unwrap_or_default().to_string())
        .collect()
}

test_each_file! { for ["json"] in "./crates/tests/fixtures/spans" => test_payload_round_trip }

fn test_payload_round_trip([input]: [&str; 1]) {
    let row = SpanRow::new("t1", "s0", "", "svc").with_payload(input);
    let table = SpanTable::try_new(span_schema(), vec![span_batch(&[row]).unwrap()]).unwrap();

    let result = reconstruct(&table, &ReconstructOptions::default())
        .unwrap_or_else(|e| panic!("Failed to reconstruct fixture: {}\n{}", e, input));

    let expected: Value = serde_json::from_str(input).unwrap();
    let span = result.document.spans().next().unwrap();
    assert_eq!(serde_json::to_value(span).unwrap(), expected);

    // Written output carries the payload unchanged
    let written: Value =
        serde_json::from_str(&to_otlp_json_string(&result.document, true).unwrap()).unwrap();
    assert_eq!(written["resourceSpans"][0]["scopeSpans"][0]["spans"][0], expected);
}

#[test]
fn test_round_trip_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spans.arrow");
    write_span_file(
        &path,
        &[
            SpanRow::new("t1", "s0", "", "svcA"),
            SpanRow::new("t1", "s1", "s0", "svcA"),
        ],
        10,
        None,
    )
    .unwrap();

    let table = SpanTable::open(&path).unwrap();
    let document = reconstruct(&table, &ReconstructOptions::default())
        .unwrap()
        .document;

    assert_eq!(document.resource_spans.len(), 1);
    let group = &document.resource_spans[0];
    assert_eq!(group.service_name(), Some("svcA"));
    assert_eq!(group.scope_spans.len(), 1);
    assert_eq!(span_ids(&group.scope_spans[0].spans), vec!["s0", "s1"]);
}

#[test]
fn test_default_service_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spans.arrow");
    write_span_file(
        &path,
        &[SpanRow::new("t1", "s0", "", "ignored").without_service()],
        10,
        None,
    )
    .unwrap();

    let table = SpanTable::open(&path).unwrap();
    let document = reconstruct(&table, &ReconstructOptions::default())
        .unwrap()
        .document;
    let group = document.resource_for_service("unknown").unwrap();
    assert_eq!(span_ids(&group.scope_spans[0].spans), vec!["s0"]);
}

#[test]
fn test_merged_conversion_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());

    let table = SpanTable::load_all(&pattern).unwrap();
    assert_eq!(table.num_rows(), 7);

    let result = reconstruct(&table, &ReconstructOptions::default()).unwrap();
    assert_eq!(result.summary.total_traces, 4);
    assert_eq!(result.summary.total_spans, 7);
    assert_eq!(result.summary.resource_groups, 3);
    assert_eq!(result.summary.skipped_rows, 0);

    let groups: Vec<(&str, Vec<String>)> = result
        .document
        .resource_spans
        .iter()
        .map(|rs| (rs.service_name().unwrap(), span_ids(&rs.scope_spans[0].spans)))
        .collect();
    let expected: Vec<(&str, Vec<String>)> = vec![
        ("frontend", vec!["s0".into(), "s1".into(), "s3".into(), "s4".into()]),
        ("backend", vec!["s2".into(), "s5".into()]),
        ("unknown", vec!["s6".into()]),
    ];
    assert_eq!(groups, expected);
}

#[test]
fn test_completeness_and_partition() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());
    let table = SpanTable::load_all(&pattern).unwrap();
    let options = ReconstructOptions::default();

    let document = reconstruct(&table, &options).unwrap().document;

    // Every decoded row appears exactly once
    let mut output = span_ids(document.spans());
    let mut decoded = span_ids(&payloads(&table, &options).unwrap());
    output.sort();
    decoded.sort();
    assert_eq!(output, decoded);

    // Every trace lands in exactly one resource group
    let mut owner: HashMap<String, usize> = HashMap::new();
    for (group, rs) in document.resource_spans.iter().enumerate() {
        for span in rs.scope_spans.iter().flat_map(|ss| &ss.spans) {
            let trace_id = span.trace_id().unwrap().to_string();
            let previous = owner.insert(trace_id.clone(), group);
            assert!(
                previous.is_none() || previous == Some(group),
                "trace {} split across groups",
                trace_id
            );
        }
    }
    assert_eq!(owner.len(), 4);
}

#[test]
fn test_output_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());
    let options = ReconstructOptions::default();

    let render = || {
        let table = SpanTable::load_all(&pattern).unwrap();
        let document = reconstruct(&table, &options).unwrap().document;
        to_otlp_json_string(&document, false).unwrap()
    };
    assert_eq!(render(), render());
}

#[test]
fn test_statistics_correctness() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());
    let table = SpanTable::load_all(&pattern).unwrap();

    let stats = compute_statistics(&table, &ReconstructOptions::default()).unwrap();
    assert_eq!(stats.total_spans, 7);
    assert_eq!(stats.unique_traces, 4);
    assert_eq!(stats.unique_services, 3);

    let kinds: Vec<(&str, usize)> = stats
        .span_kinds
        .iter()
        .map(|k| (k.kind.as_str(), k.count))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("SPAN_KIND_INTERNAL", 4),
            ("SPAN_KIND_SERVER", 2),
            ("SPAN_KIND_CLIENT", 1),
        ]
    );
    assert!((stats.avg_duration_ms - 11.0 / 7.0).abs() < 1e-9);
    assert!((stats.total_duration_seconds - 0.011).abs() < 1e-12);
}

#[test]
fn test_statistics_on_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.arrow");
    write_span_file(&path, &[], 10, None).unwrap();

    let table = SpanTable::open(&path).unwrap();
    assert!(table.is_empty());
    assert!(matches!(
        compute_statistics(&table, &ReconstructOptions::default()),
        Err(ArrowTraceError::EmptyTable)
    ));
}

#[test]
fn test_streaming_equivalence() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());
    let options = ReconstructOptions::default();

    let table = SpanTable::load_all(&pattern).unwrap();
    let expected = payloads(&table, &options).unwrap();

    for batch_size in 1..=8 {
        let batches: Vec<Vec<SpanPayload>> = stream_batches(&pattern, batch_size, &options)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= batch_size));
        let streamed: Vec<SpanPayload> = batches.into_iter().flatten().collect();
        assert_eq!(streamed, expected, "batch size {}", batch_size);
    }
}

#[test]
fn test_streaming_flushes_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());

    let sizes: Vec<usize> = stream_batches(&pattern, 3, &ReconstructOptions::default())
        .unwrap()
        .map(|b| b.unwrap().len())
        .collect();
    assert_eq!(sizes, vec![3, 1, 3]);
}

#[test]
fn test_stream_skips_bad_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spans.arrow");
    write_span_file(
        &path,
        &[
            SpanRow::new("t1", "s0", "", "svc"),
            SpanRow::new("t1", "s1", "s0", "svc").with_payload("{truncated"),
            SpanRow::new("t1", "s2", "s0", "svc"),
        ],
        10,
        None,
    )
    .unwrap();
    let pattern = path.to_str().unwrap();

    let options = ReconstructOptions::default().with_decode_policy(DecodePolicy::Skip);
    let mut stream = stream_batches(pattern, 10, &options).unwrap();
    let spans: Vec<SpanPayload> = stream.by_ref().flat_map(|b| b.unwrap()).collect();
    assert_eq!(span_ids(&spans), vec!["s0", "s2"]);
    assert_eq!(stream.skipped(), 1);

    let table = SpanTable::open(&path).unwrap();
    assert!(matches!(
        reconstruct(&table, &ReconstructOptions::default()),
        Err(ArrowTraceError::PayloadDecode { row: 1, .. })
    ));
}

#[test]
fn test_windows_cover_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());

    let windows: Vec<SpanTable> = stream_windows(&pattern, 3)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let sizes: Vec<usize> = windows.iter().map(SpanTable::num_rows).collect();
    assert_eq!(sizes, vec![3, 1, 3]);
}

#[test]
fn test_training_examples_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = write_sample_files(dir.path());
    let table = SpanTable::load_all(&pattern).unwrap();

    let examples = training_examples(&table, &ReconstructOptions::default()).unwrap();
    let ids: Vec<&str> = examples.iter().map(|e| e.trace_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3", "t4"]);

    let t1 = &examples[0];
    assert_eq!(t1.service_names, vec!["frontend", "backend"]);
    assert_eq!(t1.span_names, vec!["op-s0", "op-s1", "op-s3"]);
    assert_eq!(t1.span_count, 3);
    assert_eq!(t1.root_span.as_deref(), Some("op-s0"));
    assert!((t1.total_duration_ms - 4.0).abs() < 1e-9);

    assert_eq!(examples[3].service_names, vec!["unknown"]);
}

#[test]
fn test_compressed_and_stream_files() {
    let dir = tempfile::tempdir().unwrap();
    let (first, second) = sample_rows();
    write_span_file(
        &dir.path().join("a.arrow"),
        &first,
        3,
        Some(CompressionType::LZ4_FRAME),
    )
    .unwrap();
    write_span_file(
        &dir.path().join("b.arrow"),
        &second[..2],
        3,
        Some(CompressionType::ZSTD),
    )
    .unwrap();
    write_span_stream(&dir.path().join("c.arrow"), &second[2..]).unwrap();

    let table = SpanTable::load_all(&format!("{}/*.arrow", dir.path().display())).unwrap();
    assert_eq!(table.num_rows(), 7);
    let spans = payloads(&table, &ReconstructOptions::default()).unwrap();
    assert_eq!(
        span_ids(&spans),
        vec!["s0", "s1", "s2", "s3", "s4", "s5", "s6"]
    );
}

#[test]
fn test_load_all_errors() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = format!("{}/*.arrow", dir.path().display());
    assert!(matches!(
        SpanTable::load_all(&pattern),
        Err(ArrowTraceError::NotFound(_))
    ));

    let (first, _) = sample_rows();
    write_span_file(&dir.path().join("a.arrow"), &first, 10, None).unwrap();
    write_trace_id_only(&dir.path().join("b.arrow"));

    assert!(matches!(
        SpanTable::load_all(&pattern),
        Err(ArrowTraceError::SchemaMismatch { index: 1, .. })
    ));
}

fn write_trace_id_only(path: &Path) {
    use arrow::array::StringArray;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::ipc::writer::FileWriter;
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![Field::new("trace_id", DataType::Utf8, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(StringArray::from(vec!["t9"]))],
    )
    .unwrap();
    let mut writer = FileWriter::try_new(std::fs::File::create(path).unwrap(), &schema).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();
}
