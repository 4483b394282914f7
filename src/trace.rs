use opentelemetry::trace::{SpanId, TraceContextExt, TraceId};
use opentelemetry::Context;
use std::sync::Arc;

/// Trace correlation read from an ambient [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceInfo {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
}

impl TraceInfo {
    /// Both identifiers must be non-zero.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }

    /// `projects/{project}/traces/{trace_id}`, the form Cloud Logging
    /// links to Cloud Trace.
    pub fn trace_path(&self, project_id: &str) -> String {
        format!("projects/{}/traces/{}", project_id, self.trace_id)
    }
}

/// One tracing system that may have populated a context.
///
/// A resolver reports `None` when its system has nothing in the context;
/// it never fails.
pub trait TraceResolver: Send + Sync {
    fn resolve(&self, cx: &Context) -> Option<TraceInfo>;
}

/// Reads the active OpenTelemetry span of the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenTelemetryResolver;

impl TraceResolver for OpenTelemetryResolver {
    fn resolve(&self, cx: &Context) -> Option<TraceInfo> {
        if !cx.has_active_span() {
            return None;
        }
        let span = cx.span();
        let sc = span.span_context();
        Some(TraceInfo {
            trace_id: sc.trace_id(),
            span_id: sc.span_id(),
            sampled: sc.is_sampled(),
        })
    }
}

/// Trace context carried by the legacy `X-Cloud-Trace-Context` header:
/// `TRACE_ID[/SPAN_ID][;o=OPTIONS]`, the span id in decimal.
///
/// Store it in a [`Context`] with [`Context::with_value`] so that
/// [`CloudTraceResolver`] can find it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudTraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
}

impl CloudTraceContext {
    pub const HEADER: &'static str = "x-cloud-trace-context";

    /// Parse a header value. Returns `None` for anything malformed.
    pub fn parse(header: &str) -> Option<Self> {
        let (ids, options) = match header.split_once(';') {
            Some((ids, options)) => (ids, Some(options)),
            None => (header, None),
        };
        let (trace, span) = match ids.split_once('/') {
            Some((trace, span)) => (trace, Some(span)),
            None => (ids, None),
        };

        if trace.len() != 32 {
            return None;
        }
        let trace_id = TraceId::from_hex(trace).ok()?;
        let span_id = match span {
            Some(s) if !s.is_empty() => SpanId::from_bytes(s.parse::<u64>().ok()?.to_be_bytes()),
            _ => SpanId::INVALID,
        };
        let sampled = options
            .and_then(|o| o.trim().strip_prefix("o="))
            .map(|flags| flags.trim() == "1")
            .unwrap_or(false);

        Some(Self {
            trace_id,
            span_id,
            sampled,
        })
    }
}

/// Reads a [`CloudTraceContext`] stored in the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudTraceResolver;

impl TraceResolver for CloudTraceResolver {
    fn resolve(&self, cx: &Context) -> Option<TraceInfo> {
        cx.get::<CloudTraceContext>().map(|c| TraceInfo {
            trace_id: c.trace_id,
            span_id: c.span_id,
            sampled: c.sampled,
        })
    }
}

/// Resolvers consulted when none are configured, highest priority first.
pub fn default_resolvers() -> Vec<Arc<dyn TraceResolver>> {
    vec![Arc::new(OpenTelemetryResolver), Arc::new(CloudTraceResolver)]
}

/// First valid trace info reported by `resolvers`, in order.
pub fn resolve(resolvers: &[Arc<dyn TraceResolver>], cx: &Context) -> Option<TraceInfo> {
    resolvers
        .iter()
        .filter_map(|r| r.resolve(cx))
        .find(TraceInfo::is_valid)
}
