use serde::Serialize;
use std::panic::Location;

/// Where a log statement executed.
///
/// Capturing a site only copies static references; turning it into a
/// [`SourceLocation`] is deferred until a handler with source capture
/// asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSite {
    file: &'static str,
    line: u32,
    function: Option<&'static str>,
}

impl LogSite {
    pub const fn new(file: &'static str, line: u32, function: Option<&'static str>) -> Self {
        Self { file, line, function }
    }

    /// The caller of the function this is invoked from, via `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    /// Build a site from `tracing` metadata. The module path stands in for
    /// the function name.
    pub fn from_metadata(meta: &'static tracing::Metadata<'static>) -> Option<Self> {
        Some(Self {
            file: meta.file()?,
            line: meta.line().unwrap_or(0),
            function: meta.module_path(),
        })
    }

    /// Resolve this site into the `sourceLocation` payload.
    pub fn resolve(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.to_string(),
            line: self.line.to_string(),
            function: self.function.map(str::to_string),
        }
    }
}

impl From<&'static Location<'static>> for LogSite {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
            function: None,
        }
    }
}

/// `logging.googleapis.com/sourceLocation` payload. Cloud Logging
/// expects the line as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_points_at_this_file() {
        let site = LogSite::caller();
        let loc = site.resolve();
        assert!(loc.file.ends_with("source.rs"), "{}", loc.file);
        assert_ne!(loc.line, "0");
        assert_eq!(loc.function, None);
    }

    #[test]
    fn function_is_omitted_when_unknown() {
        let loc = LogSite::new("src/main.rs", 12, None).resolve();
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json, serde_json::json!({"file": "src/main.rs", "line": "12"}));
    }

    #[test]
    fn function_is_kept_when_known() {
        let loc = LogSite::new("src/main.rs", 3, Some("app::run")).resolve();
        assert_eq!(loc.function.as_deref(), Some("app::run"));
    }
}
