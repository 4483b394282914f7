use chrono::{DateTime, Utc};

use crate::attr::Attr;
use crate::level::Level;
use crate::source::LogSite;

/// One log call: created by the caller, consumed synchronously by a
/// [`Handler`](crate::handler::Handler), never stored.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
    pub site: Option<LogSite>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            attrs: Vec::new(),
            site: None,
        }
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn with_site(mut self, site: LogSite) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn add(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }
}
