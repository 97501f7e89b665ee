use super::LogWriter;
use std::io::{Error as IoError, Stderr, StderrLock, Stdout, StdoutLock, Write};

// Abstraction over stdout and stderr
enum StdStream {
    Out(Stdout),
    Err(Stderr),
}
impl<'a> StdStream {
    fn lock(&'a self) -> StdStreamLock<'a> {
        match self {
            StdStream::Out(ref s) => StdStreamLock::Out(s.lock()),
            StdStream::Err(ref s) => StdStreamLock::Err(s.lock()),
        }
    }
}

enum StdStreamLock<'a> {
    Out(StdoutLock<'a>),
    Err(StderrLock<'a>),
}
impl Write for StdStreamLock<'_> {
    fn write(&mut self, buffer: &[u8]) -> std::result::Result<usize, IoError> {
        match self {
            StdStreamLock::Out(l) => l.write(buffer),
            StdStreamLock::Err(l) => l.write(buffer),
        }
    }
    fn flush(&mut self) -> std::result::Result<(), IoError> {
        match self {
            StdStreamLock::Out(l) => l.flush(),
            StdStreamLock::Err(l) => l.flush(),
        }
    }
}

/// Writes each rendered event as a line to stdout or stderr, and flushes immediately.
pub struct StdWriter {
    stream: StdStream,
}
impl StdWriter {
    /// A writer to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            stream: StdStream::Out(std::io::stdout()),
        }
    }

    /// A writer to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            stream: StdStream::Err(std::io::stderr()),
        }
    }
}
impl LogWriter for StdWriter {
    fn write(&self, content: &[u8]) -> std::io::Result<()> {
        // hold the lock for the whole line, so that lines of different threads don't mix
        let mut w = self.stream.lock();
        w.write_all(content)?;
        w.write_all(b"\n")?;
        w.flush()
    }

    fn flush(&self) -> std::io::Result<()> {
        self.stream.lock().flush()
    }
}
