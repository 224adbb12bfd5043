//! Column name constants for span batch files
//!
//! One row holds one span. The payload column carries the full span as
//! serialized JSON; the remaining columns mirror a few of its fields so that
//! grouping and statistics can run without decoding the payload.

/// Trace identifier, shared by every span of a trace
pub const TRACE_ID: &str = "trace_id";

/// Span identifier, unique within a trace
pub const SPAN_ID: &str = "span_id";

/// Parent span identifier (empty string for the root span)
pub const PARENT_SPAN_ID: &str = "parent_span_id";

/// Owning service (resource) name
pub const SERVICE_NAME: &str = "service_name";

/// Span operation name
pub const NAME: &str = "name";

/// Span kind, written either as text or as the numeric OTLP enum
pub const KIND: &str = "kind";

/// Span duration in nanoseconds
pub const DURATION_NS: &str = "duration_ns";

/// Full OTLP span serialized as JSON
pub const OTLP_SPAN: &str = "otlp_span";

/// Legacy payload column used by older batch files
pub const ATTRIBUTES_JSON: &str = "attributes_json";

/// Keys inside a decoded OTLP span payload
pub mod payload {
    pub const TRACE_ID: &str = "traceId";
    pub const SPAN_ID: &str = "spanId";
    pub const PARENT_SPAN_ID: &str = "parentSpanId";
    pub const NAME: &str = "name";
    pub const KIND: &str = "kind";
    pub const ATTRIBUTES: &str = "attributes";
    pub const EVENTS: &str = "events";
}
