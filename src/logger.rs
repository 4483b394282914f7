use opentelemetry::Context;

use crate::attr::Attr;
use crate::handler::{Handler, HandlerOptions};
use crate::level::Level;
use crate::record::Record;
use crate::sink::LogSink;
use crate::source::LogSite;

/// Front-end for a [`Handler`].
///
/// Checks the level, captures the call site and the ambient
/// OpenTelemetry context, and hands the record over. Write failures are
/// reported on stderr; logging never panics or returns an error to the
/// caller.
///
/// ```no_run
/// use cloud_logging_handler::{attr::labels, Attr, HandlerOptions, Logger, StdoutSink};
///
/// let logger = Logger::new(
///     StdoutSink,
///     HandlerOptions::default()
///         .add_source(true)
///         .default_labels([Attr::string("defaultLabel", "hoge")]),
/// );
/// let logger = logger.with(&[labels([Attr::string("commonLabel", "fuga")])]);
/// logger.info("Hello World", [labels([Attr::string("specifiedLabel", "piyo")])]);
/// ```
#[derive(Clone, Debug)]
pub struct Logger {
    handler: Handler,
}

impl Logger {
    pub fn new(sink: impl LogSink + 'static, opts: HandlerOptions) -> Self {
        Self::from_handler(Handler::new(sink, opts))
    }

    pub fn from_handler(handler: Handler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Logger whose records all carry `attrs`.
    pub fn with(&self, attrs: &[Attr]) -> Logger {
        Self::from_handler(self.handler.with_attrs(attrs))
    }

    /// Logger whose fields are nested under `name`.
    pub fn with_group(&self, name: &str) -> Logger {
        Self::from_handler(self.handler.with_group(name))
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Log with the current OpenTelemetry context.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        if !self.enabled(level) {
            return;
        }
        let cx = Context::current();
        self.emit(&cx, level, message, attrs, LogSite::caller());
    }

    /// Log with an explicit context.
    #[track_caller]
    pub fn log_ctx(
        &self,
        cx: &Context,
        level: Level,
        message: &str,
        attrs: impl IntoIterator<Item = Attr>,
    ) {
        if !self.enabled(level) {
            return;
        }
        self.emit(cx, level, message, attrs, LogSite::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::DEBUG, message, attrs)
    }

    #[track_caller]
    pub fn info(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::INFO, message, attrs)
    }

    #[track_caller]
    pub fn warn(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::WARNING, message, attrs)
    }

    #[track_caller]
    pub fn error(&self, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log(Level::ERROR, message, attrs)
    }

    #[track_caller]
    pub fn debug_ctx(&self, cx: &Context, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log_ctx(cx, Level::DEBUG, message, attrs)
    }

    #[track_caller]
    pub fn info_ctx(&self, cx: &Context, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log_ctx(cx, Level::INFO, message, attrs)
    }

    #[track_caller]
    pub fn warn_ctx(&self, cx: &Context, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log_ctx(cx, Level::WARNING, message, attrs)
    }

    #[track_caller]
    pub fn error_ctx(&self, cx: &Context, message: &str, attrs: impl IntoIterator<Item = Attr>) {
        self.log_ctx(cx, Level::ERROR, message, attrs)
    }

    fn emit(
        &self,
        cx: &Context,
        level: Level,
        message: &str,
        attrs: impl IntoIterator<Item = Attr>,
        site: LogSite,
    ) {
        let record = Record::new(level, message)
            .with_attrs(attrs)
            .with_site(site);
        if let Err(e) = self.handler.handle(&record, Some(cx)) {
            eprintln!("cloud logging handler: {}", e);
        }
    }
}
