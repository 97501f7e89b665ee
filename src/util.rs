use std::{
    io::Write,
    path::PathBuf,
    sync::{Mutex, MutexGuard, RwLock},
};

/// Describes where `fieldlog` reports failures that occur while log events are processed.
///
/// Such failures never reach the code that issued the log call; they are printed to this
/// channel instead. See [`error_info`](crate::error_info) for the meaning of the error codes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ErrorChannel {
    /// Write failure reports to stderr.
    #[default]
    StdErr,
    /// Write failure reports to stdout.
    StdOut,
    /// Append failure reports to the given file.
    File(PathBuf),
    /// Don't write failure reports anywhere.
    DevNull,
}

static ERROR_CHANNEL: RwLock<ErrorChannel> = RwLock::new(ErrorChannel::StdErr);

/// Chooses the channel to which `fieldlog` reports its own failures.
pub fn set_error_channel(channel: ErrorChannel) {
    match ERROR_CHANNEL.write() {
        Ok(mut guard) => *guard = channel,
        Err(poisoned) => *poisoned.into_inner() = channel,
    }
}

fn error_channel() -> ErrorChannel {
    match ERROR_CHANNEL.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum ErrorCode {
    Render,
    Write,
    Rotate,
    Cleanup,
    Mail,
    Poison,
    Abort,
}
impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Render => "Render",
            Self::Write => "Write",
            Self::Rotate => "Rotate",
            Self::Cleanup => "Cleanup",
            Self::Mail => "Mail",
            Self::Poison => "Poison",
            Self::Abort => "Abort",
        }
    }
}

pub(crate) fn eprint_err(error_code: ErrorCode, msg: &str, err: &dyn std::error::Error) {
    let s = format!(
        "[fieldlog][ERRCODE::{code}] {msg}, caused by {err:?}",
        code = error_code.as_str(),
    );
    try_to_write(&s);
}

pub(crate) fn eprint_msg(error_code: ErrorCode, msg: &str) {
    let s = format!(
        "[fieldlog][ERRCODE::{code}] {msg}",
        code = error_code.as_str(),
    );
    try_to_write(&s);
}

fn try_to_write(s: &str) {
    match error_channel() {
        ErrorChannel::StdErr => {
            eprintln!("{s}");
        }
        ErrorChannel::StdOut => {
            println!("{s}");
        }
        ErrorChannel::File(path) => try_to_write_to_file(s, &path).unwrap_or_else(|e| {
            eprintln!("{s}");
            eprintln!("Can't open error output file, caused by: {e}");
        }),
        ErrorChannel::DevNull => {}
    }
}

fn try_to_write_to_file(s: &str, path: &PathBuf) -> Result<(), std::io::Error> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{s}")?;
    file.flush()
}

// Locks the mutex also if it is poisoned, and reports the poisoning.
pub(crate) fn lock_or_report<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        eprint_msg(
            ErrorCode::Poison,
            &format!("lock of {what} is poisoned, continuing with its last state"),
        );
        poisoned.into_inner()
    })
}

pub(crate) fn io_err(s: &'static str) -> std::io::Error {
    std::io::Error::other(s)
}

#[cfg(test)]
mod test {
    use super::{eprint_msg, set_error_channel, ErrorChannel, ErrorCode};

    #[test]
    fn test_error_channel_file() {
        let dir = temp_dir::TempDir::new().unwrap();
        let err_file = dir.child("fieldlog.err");
        set_error_channel(ErrorChannel::File(err_file.clone()));
        eprint_msg(ErrorCode::Mail, "first report");
        eprint_msg(ErrorCode::Rotate, "second report");
        set_error_channel(ErrorChannel::StdErr);

        let content = std::fs::read_to_string(&err_file).unwrap();
        assert!(content.contains("[fieldlog][ERRCODE::Mail] first report"));
        assert!(content.contains("[fieldlog][ERRCODE::Rotate] second report"));
    }
}
