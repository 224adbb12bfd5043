//! Domain types for reconstructed traces
//!
//! [`SpanPayload`] holds one decoded span exactly as it was serialized, without
//! committing to the OTLP span schema. The [`otlp`] module provides the
//! `resourceSpans → scopeSpans → spans` export tree the payloads are placed in.

pub mod otlp;
pub mod payload;

pub use otlp::{AnyValue, KeyValue, Resource, ResourceSpans, ScopeSpans, TracesDocument};
pub use payload::{PayloadError, SpanPayload};
