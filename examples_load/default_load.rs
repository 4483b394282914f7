use std::time::Instant;
use tracing::error;

use cloud_logging_handler::attr::labels;
use cloud_logging_handler::init::init_tracing_with_sink;
use cloud_logging_handler::layer::CloudLoggingLayer;
use cloud_logging_handler::noop_sink::NoopSink;
use cloud_logging_handler::{Attr, HandlerOptions, Logger};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn main() -> cloud_logging_handler::Result<()> {
    let opts = HandlerOptions::default()
        .project_id("load-test")
        .add_source(true)
        .default_labels([Attr::string("env", "bench")]);

    let n: u64 = 100_000;

    let logger = Logger::new(NoopSink, opts.clone())
        .with(&[labels([Attr::string("team", "core")])])
        .with_group("request");
    let start = Instant::now();
    for i in 0..n {
        logger.error("default load test error", [Attr::uint("iteration", i)]);
    }
    report("logger", n, start);

    // Same workload through the tracing layer, once as a scoped
    // subscriber and once as the global default.
    let layer = CloudLoggingLayer::new(NoopSink, opts.clone());
    let start = Instant::now();
    tracing::subscriber::with_default(Registry::default().with(layer), || {
        for i in 0..n {
            error!(iteration = i, "default load test error");
        }
    });
    report("scoped layer", n, start);

    init_tracing_with_sink(NoopSink, opts)?;
    let start = Instant::now();
    for i in 0..n {
        error!(iteration = i, labels.shard = i % 4, "default load test error");
    }
    report("global layer", n, start);

    Ok(())
}

fn report(name: &str, n: u64, start: Instant) {
    let elapsed = start.elapsed();
    println!(
        "{}: rendered {} records in {:?} (~{:.0} rec/s)",
        name,
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
