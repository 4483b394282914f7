use std::net::SocketAddr;
use std::time::{Duration, Instant};

use cloud_logging_handler::attr::labels;
use cloud_logging_handler::http::{make_latency, HttpPayload};
use cloud_logging_handler::init::init_tracing;
use cloud_logging_handler::trace::CloudTraceContext;
use cloud_logging_handler::{Attr, HandlerOptions, Level, Logger, StdoutSink};
use opentelemetry::Context;
use tracing::{info, warn};

/// Writes Cloud Logging JSON to stdout the way a Cloud Run service
/// would, once through a `Logger` and once through `tracing` macros.
/// Set `GOOGLE_CLOUD_PROJECT` to see trace fields.
fn main() -> cloud_logging_handler::Result<()> {
    let logger = Logger::new(
        StdoutSink,
        HandlerOptions::default()
            .add_source(true)
            .level(Level::DEBUG)
            .default_labels([Attr::string("service", "stdout-example")]),
    );

    logger.info("starting server...", []);

    let mut req = http::Request::get("https://example.com/articles/4?s=1")
        .header("user-agent", "curl/8.5.0")
        .header(
            CloudTraceContext::HEADER,
            "105445aa7843bc8bf206b12000100000/1;o=1",
        )
        .body(())
        .map_err(std::io::Error::other)?;
    req.extensions_mut()
        .insert(SocketAddr::from(([10, 0, 0, 7], 41234)));

    let started = Instant::now();
    let cx = req
        .headers()
        .get(CloudTraceContext::HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CloudTraceContext::parse)
        .map(|c| Context::current().with_value(c))
        .unwrap_or_else(Context::current);

    let res = http::Response::builder()
        .status(200)
        .header("content-length", "2")
        .body(())
        .map_err(std::io::Error::other)?;

    let payload = HttpPayload::from_request(&req, Some(&res))
        .with_latency(make_latency(started.elapsed() + Duration::from_millis(100), false));

    logger
        .with(&[labels([Attr::string("route", "/articles/:id")])])
        .with_group("handler")
        .info_ctx(&cx, "log handle", [payload.to_attr(), Attr::int("article", 4)]);

    init_tracing(HandlerOptions::default().add_source(true))?;
    let _guard = cx.attach();
    info!(labels.route = "/articles/:id", article = 4, "handled via tracing");
    warn!(port = 8080, "defaulting to port");

    Ok(())
}
