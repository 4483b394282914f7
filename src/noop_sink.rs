use crate::sink::LogSink;
use std::io;

/// A sink that simply drops all lines.
///
/// Useful for measuring the overhead of rendering and encoding without
/// any output I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_line(&self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
