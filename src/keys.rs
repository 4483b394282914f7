//! Output keys with special placement in a Cloud Logging entry.
//!
//! See <https://cloud.google.com/logging/docs/structured-logging#special-payload-fields>.

pub const MESSAGE_KEY: &str = "message";
pub const SEVERITY_KEY: &str = "severity";
pub const HTTP_KEY: &str = "httpRequest";
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const LABEL_KEY: &str = "logging.googleapis.com/labels";

pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const TRACE_SAMPLED_KEY: &str = "logging.googleapis.com/trace_sampled";

/// Timestamp key. Not reserved: Cloud Logging reads it, but it is always
/// written by the emitter itself.
pub const TIME_KEY: &str = "time";

/// Keys that are lifted to the top level of every entry and never nested
/// inside a group.
pub const RESERVED_KEYS: [&str; 8] = [
    MESSAGE_KEY,
    SEVERITY_KEY,
    HTTP_KEY,
    SOURCE_LOCATION_KEY,
    LABEL_KEY,
    TRACE_KEY,
    SPAN_ID_KEY,
    TRACE_SAMPLED_KEY,
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}
