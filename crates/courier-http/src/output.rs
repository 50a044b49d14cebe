//! Line-oriented output shared between the caller and runtime workers

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Where the runner prints status codes and bodies.
///
/// Each [`line`](OutputSink::line) call takes the lock once, so lines from
/// the caller thread and from completion handlers never interleave mid-line.
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// In-memory sink plus a handle to read back what was written.
    pub fn capture() -> (Self, CapturedOutput) {
        let buffer = CapturedOutput::default();
        (Self::new(buffer.clone()), buffer)
    }

    pub fn line(&self, text: impl AsRef<str>) {
        let mut writer = self.writer.lock();
        let result = writeln!(writer, "{}", text.as_ref()).and_then(|_| writer.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write output line");
        }
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

/// Shared in-memory buffer behind [`OutputSink::capture`].
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
