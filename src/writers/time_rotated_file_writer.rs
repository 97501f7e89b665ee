mod builder;
mod partitions;
mod state;

pub use self::builder::TimeRotatedFileWriterBuilder;

use self::state::State;
use super::LogWriter;
use std::{path::Path, sync::Arc, time::Duration};

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) path: std::path::PathBuf,
    pub(crate) timestamp_format: String,
    pub(crate) interval: Duration,
    // zero: keep all partitions
    pub(crate) keep: Duration,
    pub(crate) close_delay: Duration,
}

/// Writes lines to a live file and moves it away at fixed time boundaries.
///
/// Time is split into windows of a fixed length, aligned in local time (e.g. with an interval of
/// one hour, windows start at every full hour of the local clock).
/// When a window ends, the live file is renamed to `<path>.<window start>`, where the window start
/// is formatted with the configured timestamp format (default: `%Y%m%d%H%M%S`),
/// and subsequent writes go to a newly created live file.
/// Writes that are in flight during the rotation complete on the old handle,
/// which is closed after a short grace period.
///
/// Optionally, partitions older than a retention period are removed after each rotation.
///
/// The background rotation thread is started with the first write, and stopped with
/// [`TimeRotatedFileWriter::shutdown`], or when the last clone of the writer is dropped.
///
/// Clones share the same live file and rotation thread.
#[derive(Clone)]
pub struct TimeRotatedFileWriter {
    state: Arc<State>,
}
impl TimeRotatedFileWriter {
    /// Instantiates a builder for a writer to the given live file path.
    #[must_use]
    pub fn builder<P: AsRef<Path>>(path: P) -> TimeRotatedFileWriterBuilder {
        TimeRotatedFileWriterBuilder::new(path.as_ref().to_path_buf())
    }

    pub(crate) fn new(config: Config) -> Self {
        Self {
            state: Arc::new(State::new(config)),
        }
    }

    /// The path of the live file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.state.config().path
    }

    /// Stops the rotation thread and closes the live file.
    ///
    /// Blocks until the rotation thread has finished. A second call has no effect.
    /// Writes after shutdown still go to the live file, but no more rotation takes place.
    pub fn shutdown(&self) {
        self.state.shutdown();
    }
}

impl LogWriter for TimeRotatedFileWriter {
    fn write(&self, content: &[u8]) -> std::io::Result<()> {
        State::write(&self.state, content)
    }

    fn shutdown(&self) {
        self.state.shutdown();
    }
}

impl std::fmt::Debug for TimeRotatedFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeRotatedFileWriter")
            .field("config", self.state.config())
            .finish_non_exhaustive()
    }
}
