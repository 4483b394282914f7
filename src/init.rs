use crate::error::Result;
use crate::handler::HandlerOptions;
use crate::layer::CloudLoggingLayer;
use crate::sink::{LogSink, StdoutSink};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Initialize the global `tracing` subscriber with a
/// [`CloudLoggingLayer`] writing to `sink`.
///
/// **Parameters**
/// - `sink`: destination for the encoded JSON lines.
/// - `opts`: [`HandlerOptions`] for the layer's handler.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with the layer as the global default
/// subscriber, so every `tracing` event in the process goes through it.
/// Fails if a global subscriber is already set.
pub fn init_tracing_with_sink(sink: impl LogSink + 'static, opts: HandlerOptions) -> Result<()> {
    let layer = CloudLoggingLayer::new(sink, opts);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Initialize tracing with stdout as the sink.
///
/// This is the recommended entrypoint on Cloud Run, GKE and App Engine,
/// where the platform's logging agent reads JSON lines from stdout.
pub fn init_tracing(opts: HandlerOptions) -> Result<()> {
    init_tracing_with_sink(StdoutSink, opts)
}
