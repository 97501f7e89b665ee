use std::{io, sync::Arc};

/// Writes rendered events to a single output stream.
///
/// Implementations append the line ending themselves, so that each call produces one line.
pub trait LogWriter: Sync + Send {
    /// Writes out a rendered event, followed by a line ending.
    ///
    /// # Errors
    ///
    /// The underlying transport's error.
    fn write(&self, content: &[u8]) -> io::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// The underlying transport's error.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Stops background activities and releases resources.
    ///
    /// Is called when the handlers are shut down, e.g. before the process is aborted.
    fn shutdown(&self) {}
}

impl<W: LogWriter + ?Sized> LogWriter for Arc<W> {
    fn write(&self, content: &[u8]) -> io::Result<()> {
        (**self).write(content)
    }
    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
    fn shutdown(&self) {
        (**self).shutdown();
    }
}

impl<W: LogWriter + ?Sized> LogWriter for Box<W> {
    fn write(&self, content: &[u8]) -> io::Result<()> {
        (**self).write(content)
    }
    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
    fn shutdown(&self) {
        (**self).shutdown();
    }
}
