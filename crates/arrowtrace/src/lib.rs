//! # arrowtrace
//!
//! Reads columnar span batch files (Arrow IPC) and rebuilds the OpenTelemetry
//! trace export tree from them.
//!
//! This crate provides:
//! - A [`SpanTable`] over one file or a glob of files, with zero-copy slicing
//! - Reconstruction of `resourceSpans → scopeSpans → spans`, grouped by trace
//!   and then by service
//! - Statistics computed from the flat columns without decoding payloads
//! - Streaming of decoded payload batches with bounded memory
//! - Per-trace training examples as newline-delimited JSON
//!
//! ## Example
//!
//! ```no_run
//! use arrowtrace::{reconstruct, write_otlp_json, ReconstructOptions, SpanTable};
//!
//! let table = SpanTable::load_all("traces_otlp.batch_*.arrow").unwrap();
//! let result = reconstruct(&table, &ReconstructOptions::default()).unwrap();
//!
//! println!("{} traces in {} services",
//!          result.summary.total_traces,
//!          result.summary.resource_groups);
//! write_otlp_json(&result.document, std::io::stdout(), true).unwrap();
//! ```

pub mod domain;
pub mod error;
pub mod iter;
pub mod options;
pub mod output;
pub mod reader;
pub mod reconstruct;
pub mod schema;
pub mod stats;
pub mod training;

pub use domain::{PayloadError, ResourceSpans, SpanPayload, TracesDocument};
pub use error::{ArrowTraceError, Result};
pub use iter::{stream_batches, stream_windows, PayloadBatches, RowView, TableWindows};
pub use options::{DecodePolicy, ReconstructOptions};
pub use output::{to_otlp_json_string, write_otlp_json};
pub use reader::{expand_pattern, SpanTable};
pub use reconstruct::{
    group_by_trace, payloads, reconstruct, ConversionSummary, Reconstruction, TraceGroups,
    TraceSpans,
};
pub use stats::{compute_statistics, KindCount, TraceStatistics};
pub use training::{training_examples, unique_span_names, write_jsonl, TrainingExample};
