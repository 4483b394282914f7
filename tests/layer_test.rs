use cloud_logging_handler::attr::labels;
use cloud_logging_handler::keys::{LABEL_KEY, SOURCE_LOCATION_KEY, TRACE_KEY};
use cloud_logging_handler::trace::CloudTraceContext;
use cloud_logging_handler::{Attr, CloudLoggingLayer, HandlerOptions, Level, MemorySink};
use opentelemetry::Context;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn entries(sink: &MemorySink) -> Vec<Value> {
    sink.lines()
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn with_layer(layer: CloudLoggingLayer, f: impl FnOnce()) {
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, f);
}

#[test]
fn events_become_entries() {
    let sink = MemorySink::new();
    with_layer(CloudLoggingLayer::new(sink.clone(), HandlerOptions::default()), || {
        error!(user_id = 42, reason = "invalid password", "authentication failed");
    });

    let entries = entries(&sink);
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e["severity"], "ERROR");
    assert_eq!(e["message"], "authentication failed");
    assert_eq!(e["user_id"], 42);
    assert_eq!(e["reason"], "invalid password");
}

#[test]
fn label_prefixed_fields_become_labels() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(
        sink.clone(),
        HandlerOptions::default().default_labels([Attr::string("env", "prod")]),
    )
    .with_attrs(&[labels([Attr::string("team", "x")])]);

    with_layer(layer, || {
        info!(labels.req = "123", path = "/", "served");
    });

    let e = &entries(&sink)[0];
    assert_eq!(e[LABEL_KEY], json!({"env": "prod", "team": "x", "req": "123"}));
    assert_eq!(e["path"], "/");
    assert!(e.get("labels.req").is_none());
}

#[test]
fn minimum_level_filters_events() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(sink.clone(), HandlerOptions::default().level(Level::WARNING));
    with_layer(layer, || {
        debug!("debug");
        info!("info");
        warn!("warn");
    });

    let entries = entries(&sink);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["severity"], "WARNING");
}

#[test]
fn groups_apply_to_event_fields() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(sink.clone(), HandlerOptions::default())
        .with_group("a")
        .with_group("b");
    with_layer(layer, || {
        info!(k = 1, "nested");
    });

    let e = &entries(&sink)[0];
    assert_eq!(e["a"]["b"]["k"], 1);
    assert!(e.get("k").is_none());
    assert_eq!(e["message"], "nested");
}

#[test]
fn source_location_from_event_metadata() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(sink.clone(), HandlerOptions::default().add_source(true));
    with_layer(layer, || {
        info!("where");
    });

    let loc = &entries(&sink)[0][SOURCE_LOCATION_KEY];
    assert!(loc["file"].as_str().unwrap().ends_with("layer_test.rs"));
    assert_eq!(loc["function"], "layer_test");
}

#[test]
fn trace_from_attached_cloud_trace_context() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(sink.clone(), HandlerOptions::default().project_id("proj"));
    let header = CloudTraceContext::parse("0123456789abcdef0123456789abcdef/12;o=1").unwrap();

    with_layer(layer, || {
        let _guard = Context::current().with_value(header).attach();
        info!("traced");
    });

    let e = &entries(&sink)[0];
    assert_eq!(
        e[TRACE_KEY],
        "projects/proj/traces/0123456789abcdef0123456789abcdef"
    );
    assert_eq!(e["logging.googleapis.com/spanId"], "000000000000000c");
    assert_eq!(e["logging.googleapis.com/trace_sampled"], true);
}

#[test]
fn no_trace_fields_without_context() {
    let sink = MemorySink::new();
    let layer = CloudLoggingLayer::new(sink.clone(), HandlerOptions::default().project_id("proj"));
    with_layer(layer, || {
        info!("untraced");
    });
    assert!(entries(&sink)[0].get(TRACE_KEY).is_none());
}
