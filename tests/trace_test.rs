use cloud_logging_handler::env::GOOGLE_CLOUD_PROJECT_ENV;
use cloud_logging_handler::keys::{SPAN_ID_KEY, TRACE_KEY, TRACE_SAMPLED_KEY};
use cloud_logging_handler::trace::{TraceInfo, TraceResolver};
use cloud_logging_handler::{HandlerOptions, Logger, MemorySink};
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry::Context;
use serde_json::Value;
use std::sync::Arc;

fn span_context() -> Context {
    let sc = SpanContext::new(
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
        SpanId::from_hex("00f067aa0ba902b7").unwrap(),
        TraceFlags::default(),
        false,
        TraceState::default(),
    );
    Context::new().with_remote_span_context(sc)
}

fn entry(sink: &MemorySink) -> Value {
    serde_json::from_str(&sink.lines()[0]).unwrap()
}

#[test]
fn project_id_from_environment_enables_trace() {
    temp_env::with_var(GOOGLE_CLOUD_PROJECT_ENV, Some("test-project"), || {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone(), HandlerOptions::default());
        logger.info_ctx(&span_context(), "Hello World", []);

        let e = entry(&sink);
        assert_eq!(
            e[TRACE_KEY],
            "projects/test-project/traces/4bf92f3577b34da6a3ce929d0e0e4736"
        );
        assert_eq!(e[SPAN_ID_KEY], "00f067aa0ba902b7");
        assert_eq!(e[TRACE_SAMPLED_KEY], false);
    });
}

#[test]
fn explicit_project_id_beats_environment() {
    temp_env::with_var(GOOGLE_CLOUD_PROJECT_ENV, Some("env-project"), || {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone(), HandlerOptions::default().project_id("mine"));
        logger.info_ctx(&span_context(), "m", []);
        assert!(entry(&sink)[TRACE_KEY]
            .as_str()
            .unwrap()
            .starts_with("projects/mine/"));
    });
}

#[test]
fn without_project_id_no_trace_keys() {
    temp_env::with_var_unset(GOOGLE_CLOUD_PROJECT_ENV, || {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone(), HandlerOptions::default());
        logger.info_ctx(&span_context(), "m", []);
        let e = entry(&sink);
        for key in [TRACE_KEY, SPAN_ID_KEY, TRACE_SAMPLED_KEY] {
            assert!(e.get(key).is_none(), "{key} should be absent");
        }
    });
}

#[test]
fn without_span_no_trace_keys() {
    temp_env::with_var(GOOGLE_CLOUD_PROJECT_ENV, Some("test-project"), || {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone(), HandlerOptions::default());
        logger.info_ctx(&Context::new(), "m", []);
        assert!(entry(&sink).get(TRACE_KEY).is_none());
    });
}

struct Fixed;

impl TraceResolver for Fixed {
    fn resolve(&self, _cx: &Context) -> Option<TraceInfo> {
        Some(TraceInfo {
            trace_id: TraceId::from_hex("11111111111111111111111111111111").unwrap(),
            span_id: SpanId::from_hex("2222222222222222").unwrap(),
            sampled: true,
        })
    }
}

#[test]
fn custom_resolvers_are_tried_in_order() {
    let sink = MemorySink::new();
    let opts = HandlerOptions::default()
        .project_id("p")
        .trace_resolvers(vec![Arc::new(Fixed)]);
    let logger = Logger::new(sink.clone(), opts);
    logger.info_ctx(&span_context(), "m", []);
    assert_eq!(
        entry(&sink)[TRACE_KEY],
        "projects/p/traces/11111111111111111111111111111111"
    );
}
