use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Numeric log level.
///
/// Levels are ordered integers anchored at the usual leveled-logging
/// values (`DEBUG = -4`, `INFO = 0`, `WARN = 4`, `ERROR = 8`). Cloud
/// Logging has more severities than that; the extra ones sit at fixed
/// offsets around the anchors so they can be compared against a minimum
/// level like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(pub i32);

impl Level {
    pub const DEFAULT: Level = Level(Self::DEBUG.0 - 2);
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const NOTICE: Level = Level(Self::WARNING.0 - 2);
    pub const WARNING: Level = Level(4);
    pub const ERROR: Level = Level(8);
    pub const CRITICAL: Level = Level(Self::ERROR.0 + 2);
    pub const ALERT: Level = Level(Self::ERROR.0 + 4);
    pub const EMERGENCY: Level = Level(Self::ERROR.0 + 6);

    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::INFO
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::severity::severity(*self) {
            "" => write!(f, "LEVEL({})", self.0),
            s => f.write_str(s),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::DEFAULT,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARNING,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        Level::from(*level)
    }
}

/// Source of the minimum level a handler accepts.
///
/// The handler asks for the level on every check, so an implementation
/// backed by shared mutable storage changes filtering at runtime.
pub trait Leveler: Send + Sync {
    fn level(&self) -> Level;
}

impl Leveler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A [`Level`] that can be changed while handlers are using it.
///
/// Share it with `Arc<LevelVar>` between [`HandlerOptions`](crate::handler::HandlerOptions)
/// and whatever adjusts verbosity (an admin endpoint, a signal handler).
#[derive(Debug, Default)]
pub struct LevelVar {
    value: AtomicI32,
}

impl LevelVar {
    pub fn new(level: Level) -> Self {
        Self {
            value: AtomicI32::new(level.0),
        }
    }

    pub fn set(&self, level: Level) {
        self.value.store(level.0, Ordering::Relaxed);
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Level {
        Level(self.value.load(Ordering::Relaxed))
    }
}

impl<T: Leveler + ?Sized> Leveler for std::sync::Arc<T> {
    fn level(&self) -> Level {
        (**self).level()
    }
}
