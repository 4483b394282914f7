//! Structured logging for Google Cloud Logging.
//!
//! A [`Handler`] turns log records into the JSON lines the Cloud Logging
//! agent understands: `severity` and `message` at the top level, labels
//! under `logging.googleapis.com/labels`, trace correlation under
//! `logging.googleapis.com/trace` and friends, user fields nested under
//! whatever groups are open. Use it through a [`Logger`] or, for
//! `tracing` users, through [`CloudLoggingLayer`].

pub mod attr;
pub mod env;
pub mod error;
pub mod handler;
pub mod json;
pub mod keys;
pub mod level;
pub mod record;
pub mod severity;
pub mod sink;
pub mod source;
pub mod trace;

pub mod layer;
pub mod logger;

#[cfg(feature = "http")]
pub mod http;

pub mod init;
pub mod noop_sink;

pub use attr::{Attr, Value};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerOptions};
pub use layer::CloudLoggingLayer;
pub use level::{Level, LevelVar, Leveler};
pub use logger::Logger;
pub use record::Record;
pub use sink::{LogSink, MemorySink, StdoutSink, WriterSink};
