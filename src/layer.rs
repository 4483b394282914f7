use opentelemetry::Context as OtelContext;
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::attr::{labels, Attr, Value};
use crate::handler::{Handler, HandlerOptions};
use crate::level::Level;
use crate::record::Record;
use crate::sink::LogSink;
use crate::source::LogSite;

/// Event fields whose name starts with this prefix become labels:
/// `info!(labels.tenant = "acme", "...")`.
pub const LABEL_FIELD_PREFIX: &str = "labels.";

/// `tracing_subscriber` layer that writes every enabled event as one
/// Cloud Logging JSON line through a [`Handler`].
///
/// Rendering and writing happen synchronously on the thread that emitted
/// the event. Trace correlation reads the current OpenTelemetry context.
#[derive(Clone, Debug)]
pub struct CloudLoggingLayer {
    handler: Handler,
}

impl CloudLoggingLayer {
    pub fn new(sink: impl LogSink + 'static, opts: HandlerOptions) -> Self {
        Self::from_handler(Handler::new(sink, opts))
    }

    pub fn from_handler(handler: Handler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Layer whose events all carry `attrs`.
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        Self::from_handler(self.handler.with_attrs(attrs))
    }

    /// Layer whose event fields are nested under `name`.
    pub fn with_group(&self, name: &str) -> Self {
        Self::from_handler(self.handler.with_group(name))
    }

    fn record_for(event: &Event<'_>) -> Record {
        let meta = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Record::new(Level::from(meta.level()), visitor.message.unwrap_or_default())
            .with_attrs(visitor.fields);
        if !visitor.labels.is_empty() {
            record.add(labels(visitor.labels));
        }
        if let Some(site) = LogSite::from_metadata(meta) {
            record = record.with_site(site);
        }
        record
    }
}

impl<S> Layer<S> for CloudLoggingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    // The minimum level can change at runtime, so callsites are never
    // cached as always or never enabled.
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        !metadata.is_event() || self.handler.enabled(Level::from(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !self.handler.enabled(Level::from(event.metadata().level())) {
            return;
        }
        let record = Self::record_for(event);
        let cx = OtelContext::current();
        if let Err(e) = self.handler.handle(&record, Some(&cx)) {
            eprintln!("cloud logging layer: failed to write event: {}", e);
        }
    }
}

/// Collects event fields into attributes.
#[derive(Default)]
pub struct FieldVisitor {
    pub message: Option<String>,
    pub fields: Vec<Attr>,
    pub labels: Vec<Attr>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        match field.name().strip_prefix(LABEL_FIELD_PREFIX) {
            Some(name) if !name.is_empty() => self.labels.push(Attr::new(name, value)),
            _ => self.fields.push(Attr::new(field.name(), value)),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::Str(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::Str(format!("{:?}", value)));
        }
    }
}
