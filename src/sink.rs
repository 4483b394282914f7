use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Byte destination for encoded log lines.
///
/// Implementations receive one complete JSON line per call and are
/// responsible for getting it to wherever the log backend reads from
/// (stdout on Cloud Run and GKE, a file, a pipe). The handler calls
/// `write_line` synchronously on the logging thread.
pub trait LogSink: Send + Sync {
    /// Write one encoded line, trailing newline included.
    ///
    /// **Returns**
    /// - `Ok(())` once the whole line was handed to the destination.
    /// - `Err(..)` with the destination's I/O error. The handler passes
    ///   it through without retrying.
    fn write_line(&self, line: &[u8]) -> io::Result<()>;

    /// Flush any buffered lines. Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes to the process stdout, holding the stdout lock for each line
/// so concurrent records never interleave.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        io::stdout().lock().write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Adapts any [`Write`] into a sink. Writes are serialized through a
/// mutex so each line lands in one piece.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        self.lock().write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

/// Keeps every line in memory. Clones share the same buffer, so one
/// clone can be handed to a handler and another used to read back.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Written lines, without their newlines.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        self.lock().extend_from_slice(line);
        Ok(())
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        (**self).write_line(line)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let writer = sink.clone();
        writer.write_line(b"{\"a\":1}\n").unwrap();
        writer.write_line(b"{\"b\":2}\n").unwrap();
        assert_eq!(sink.lines(), vec!["{\"a\":1}", "{\"b\":2}"]);
        sink.clear();
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn writer_sink_writes_through() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line(b"line\n").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_inner(), b"line\n");
    }
}
