use super::{
    partitions::{is_reversible, window_end, window_start},
    Config, TimeRotatedFileWriter,
};
use crate::{event::is_valid_timestamp_format, FieldLogError};
use chrono::Local;
use std::{path::PathBuf, time::Duration};

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_CLOSE_DELAY: Duration = Duration::from_secs(1);

/// Builder for [`TimeRotatedFileWriter`].
#[allow(clippy::module_name_repetitions)]
pub struct TimeRotatedFileWriterBuilder {
    path: PathBuf,
    timestamp_format: String,
    interval: Duration,
    keep: Duration,
    close_delay: Duration,
}

impl TimeRotatedFileWriterBuilder {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            interval: DEFAULT_INTERVAL,
            keep: Duration::ZERO,
            close_delay: DEFAULT_CLOSE_DELAY,
        }
    }

    /// The `chrono` format for the window start that is appended to the name of rotated files.
    ///
    /// The format must contain enough of the window start to restore it from the file name,
    /// e.g. with an hourly interval, the date and the hour are necessary.
    ///
    /// The default is `%Y%m%d%H%M%S`.
    #[must_use]
    pub fn timestamp_format<S: Into<String>>(mut self, format: S) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// The length of the time windows; must be a positive number of whole seconds,
    /// and not more than `u32::MAX` seconds.
    ///
    /// The default is one day.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Rotated files whose window started more than this period before the most recently closed
    /// window are removed.
    ///
    /// `Duration::ZERO` (the default) keeps all rotated files.
    #[must_use]
    pub fn keep(mut self, keep: Duration) -> Self {
        self.keep = keep;
        self
    }

    /// How long the old file handle stays open after a rotation,
    /// so that writes in flight can complete.
    ///
    /// The default is one second.
    #[must_use]
    pub fn close_delay(mut self, close_delay: Duration) -> Self {
        self.close_delay = close_delay;
        self
    }

    /// Produces the writer.
    ///
    /// The live file is created with the first write.
    /// The folder of the live file is created if necessary.
    ///
    /// # Errors
    ///
    /// `FieldLogError::InvalidInterval` if the interval is zero or not a whole number of seconds,
    /// `FieldLogError::Template` if the timestamp format is invalid or
    /// doesn't identify the window starts,
    /// `FieldLogError::Io` if the folder can't be created.
    pub fn try_build(self) -> Result<TimeRotatedFileWriter, FieldLogError> {
        if self.interval.as_secs() == 0
            || self.interval.as_secs() > u64::from(u32::MAX)
            || self.interval.subsec_nanos() != 0
        {
            return Err(FieldLogError::InvalidInterval(self.interval));
        }
        if !is_valid_timestamp_format(&self.timestamp_format) {
            return Err(FieldLogError::Template(format!(
                "invalid timestamp format {:?}",
                self.timestamp_format
            )));
        }
        let start = window_start(Local::now(), self.interval);
        let next_start = window_end(start, self.interval);
        if !(is_reversible(&self.timestamp_format, &start)
            && is_reversible(&self.timestamp_format, &next_start))
        {
            return Err(FieldLogError::Template(format!(
                "timestamp format {:?} does not identify windows of {:?}",
                self.timestamp_format, self.interval
            )));
        }
        if self.path.file_name().is_none() {
            return Err(FieldLogError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file path", self.path.display()),
            )));
        }
        if let Some(folder) = self.path.parent() {
            if !folder.as_os_str().is_empty() {
                std::fs::create_dir_all(folder)?;
            }
        }
        Ok(TimeRotatedFileWriter::new(Config {
            path: self.path,
            timestamp_format: self.timestamp_format,
            interval: self.interval,
            keep: self.keep,
            close_delay: self.close_delay,
        }))
    }
}
