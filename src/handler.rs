use opentelemetry::Context;
use std::fmt;
use std::sync::Arc;

use crate::attr::{flatten_labels, split_labels, Attr, Value};
use crate::error::Result;
use crate::json::Entry;
use crate::keys::{
    is_reserved, LABEL_KEY, MESSAGE_KEY, SEVERITY_KEY, SOURCE_LOCATION_KEY, SPAN_ID_KEY, TIME_KEY,
    TRACE_KEY, TRACE_SAMPLED_KEY,
};
use crate::level::{Level, Leveler};
use crate::record::Record;
use crate::severity::severity;
use crate::sink::LogSink;
use crate::trace::{self, TraceResolver};

/// Handler configuration, fixed for the lifetime of a handler and every
/// handler derived from it.
#[derive(Clone)]
pub struct HandlerOptions {
    /// Google Cloud project id, used to build trace paths. Falls back to
    /// `GOOGLE_CLOUD_PROJECT` when unset. Without a project id no trace
    /// fields are written.
    pub project_id: Option<String>,
    /// Write `logging.googleapis.com/sourceLocation`. Off by default since
    /// resolving the log site is the most expensive step of rendering.
    pub add_source: bool,
    /// Minimum level. Records below it are dropped before rendering.
    pub level: Arc<dyn Leveler>,
    /// Labels added to every entry, lowest precedence.
    pub default_labels: Vec<Attr>,
    /// Tracing systems consulted for trace correlation, first match wins.
    pub trace_resolvers: Vec<Arc<dyn TraceResolver>>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            project_id: None,
            add_source: false,
            level: Arc::new(Level::INFO),
            default_labels: Vec::new(),
            trace_resolvers: trace::default_resolvers(),
        }
    }
}

impl HandlerOptions {
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    pub fn level(mut self, level: impl Leveler + 'static) -> Self {
        self.level = Arc::new(level);
        self
    }

    pub fn default_labels(mut self, labels: impl IntoIterator<Item = Attr>) -> Self {
        self.default_labels = labels.into_iter().collect();
        self
    }

    pub fn trace_resolvers(mut self, resolvers: Vec<Arc<dyn TraceResolver>>) -> Self {
        self.trace_resolvers = resolvers;
        self
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("project_id", &self.project_id)
            .field("add_source", &self.add_source)
            .field("level", &self.level.level())
            .field("default_labels", &self.default_labels)
            .field("trace_resolvers", &self.trace_resolvers.len())
            .finish()
    }
}

/// Turns [`Record`]s into Cloud Logging JSON lines.
///
/// A handler carries the labels and groups accumulated through
/// [`with_attrs`](Self::with_attrs) and [`with_group`](Self::with_group).
/// Deriving copies that state, so a parent and its children never share
/// anything mutable; one handler can be used from any number of threads
/// without locking.
#[derive(Clone)]
pub struct Handler {
    sink: Arc<dyn LogSink>,
    opts: Arc<HandlerOptions>,
    labels: Vec<Attr>,
    // Reserved-key attributes bound by `with_attrs`. Never grouped.
    reserved: Vec<Attr>,
    groups: Vec<String>,
    // bound[i] holds attributes bound while `i` groups were open, so
    // there is always one more entry than there are groups.
    bound: Vec<Vec<Attr>>,
}

impl Handler {
    pub fn new(sink: impl LogSink + 'static, opts: HandlerOptions) -> Self {
        Self::with_sink(Arc::new(sink), opts)
    }

    pub fn with_sink(sink: Arc<dyn LogSink>, mut opts: HandlerOptions) -> Self {
        if opts.project_id.as_deref().map_or(true, str::is_empty) {
            opts.project_id = crate::env::project_id_from_env();
        }
        Self {
            sink,
            opts: Arc::new(opts),
            labels: Vec::new(),
            reserved: Vec::new(),
            groups: Vec::new(),
            bound: vec![Vec::new()],
        }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.opts
    }

    /// Whether a record at `level` passes the minimum level.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.opts.level.level()
    }

    /// Derive a handler that adds `attrs` to every record.
    ///
    /// Members of inline label groups join the accumulated labels and
    /// reserved-key attributes stay at the top level. All other attributes
    /// are bound inside the groups open right now.
    pub fn with_attrs(&self, attrs: &[Attr]) -> Handler {
        let mut child = self.clone();
        if attrs.is_empty() {
            return child;
        }
        let (labels, rest) = split_labels(attrs);
        child.labels.extend(labels);
        let (reserved, plain): (Vec<_>, Vec<_>) = rest.into_iter().partition(is_reserved_field);
        child.reserved.extend(reserved);
        if let Some(current) = child.bound.last_mut() {
            current.extend(plain);
        }
        child
    }

    /// Derive a handler that nests the plain fields of later records, and
    /// of attributes bound afterwards, under `name`. An empty name leaves
    /// the handler unchanged.
    pub fn with_group(&self, name: &str) -> Handler {
        let mut child = self.clone();
        if name.is_empty() {
            return child;
        }
        child.groups.push(name.to_string());
        child.bound.push(Vec::new());
        child
    }

    /// Render and write one record.
    pub fn handle(&self, record: &Record, cx: Option<&Context>) -> Result<()> {
        let line = self.render(record, cx).encode_line()?;
        self.sink.write_line(&line)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Classify and merge a record with the accumulated state.
    ///
    /// Labels merge as default labels, then derived labels oldest first,
    /// then the record's inline labels; nothing is deduplicated, the
    /// encoder keeps the last value per key. Only plain fields are wrapped
    /// in groups. Labels and reserved fields stay at the top level.
    ///
    /// Reserved fields, bound ones first, follow the labels. A `severity`
    /// or `message` field is dropped when the handler writes that key
    /// itself.
    pub fn render(&self, record: &Record, cx: Option<&Context>) -> Entry {
        let mut labels = Vec::with_capacity(self.opts.default_labels.len() + self.labels.len());
        labels.extend_from_slice(&self.opts.default_labels);
        labels.extend_from_slice(&self.labels);

        let mut reserved = self.reserved.clone();
        let mut plain = Vec::with_capacity(record.attrs.len());
        for attr in &record.attrs {
            match &attr.value {
                Value::Group(members) if attr.key == LABEL_KEY => {
                    labels.extend(members.iter().cloned())
                }
                _ if is_reserved_field(attr) => reserved.push(attr.clone()),
                _ => plain.push(attr.clone()),
            }
        }

        let mut head = Vec::with_capacity(3);
        head.push(Attr::time(TIME_KEY, record.time));
        head.push(Attr::string(SEVERITY_KEY, severity(record.level)));
        if !record.message.is_empty() {
            head.push(Attr::string(MESSAGE_KEY, record.message.clone()));
        }
        reserved.retain(|attr| !head.iter().any(|h| h.key == attr.key));

        let payload = self.nest(plain);

        let mut tail = Vec::with_capacity(reserved.len() + 5);
        if !labels.is_empty() {
            tail.push(Attr::group(LABEL_KEY, flatten_labels(&labels)));
        }
        tail.extend(reserved);

        if self.opts.add_source {
            if let Some(site) = record.site {
                let location = serde_json::to_value(site.resolve()).unwrap_or_default();
                tail.push(Attr::json(SOURCE_LOCATION_KEY, location));
            }
        }

        self.append_trace(&mut tail, cx);

        Entry {
            head,
            payload,
            tail,
        }
    }

    // Wrap innermost first: the deepest level holds attributes bound
    // there plus the record's fields, and each level outwards holds its
    // own bound attributes followed by the group below it.
    fn nest(&self, plain: Vec<Attr>) -> Vec<Attr> {
        let depth = self.groups.len();
        let mut fields = self.bound[depth].clone();
        fields.extend(plain);
        for i in (0..depth).rev() {
            let inner = std::mem::replace(&mut fields, self.bound[i].clone());
            fields.push(Attr::group(self.groups[i].clone(), inner));
        }
        fields
    }

    fn append_trace(&self, tail: &mut Vec<Attr>, cx: Option<&Context>) {
        let (Some(project_id), Some(cx)) = (self.opts.project_id.as_deref(), cx) else {
            return;
        };
        if let Some(info) = trace::resolve(&self.opts.trace_resolvers, cx) {
            tail.push(Attr::string(TRACE_KEY, info.trace_path(project_id)));
            tail.push(Attr::string(SPAN_ID_KEY, info.span_id.to_string()));
            tail.push(Attr::bool(TRACE_SAMPLED_KEY, info.sampled));
        }
    }
}

fn is_reserved_field(attr: &Attr) -> bool {
    attr.key != LABEL_KEY && is_reserved(&attr.key)
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("opts", &self.opts)
            .field("labels", &self.labels)
            .field("reserved", &self.reserved)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}
