use crate::{router, Caller, Event, FieldLogError, Level, Router};
use std::borrow::Cow;

/// Forwards the log calls of the `log` crate (`log::info!` etc.) to the process-wide router.
///
/// The level names are the lowercase names of the `log` levels
/// (`error`, `warn`, `info`, `debug`, `trace`).
/// Module path, file and line of the `log` call are used as caller;
/// the function name is not available.
///
/// Install it with [`init_log_bridge`].
#[derive(Debug, Default)]
pub struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        // filtering by level happens through log::max_level() and the routing table
        true
    }

    fn log(&self, record: &log::Record) {
        dispatch_record(router::global(), record);
    }

    fn flush(&self) {}
}

/// Installs the [`LogBridge`] as the logger of the `log` crate.
///
/// # Errors
///
/// `FieldLogError::Log` if a logger was installed already.
pub fn init_log_bridge(max_level: log::LevelFilter) -> Result<(), FieldLogError> {
    log::set_boxed_logger(Box::new(LogBridge))?;
    log::set_max_level(max_level);
    Ok(())
}

fn level_of(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::ERROR,
        log::Level::Warn => Level::WARN,
        log::Level::Info => Level::INFO,
        log::Level::Debug => Level::DEBUG,
        log::Level::Trace => Level::new("trace"),
    }
}

fn caller_of(record: &log::Record) -> Caller {
    Caller {
        module: record.module_path_static().map_or_else(
            || Cow::Owned(record.module_path().unwrap_or_default().to_string()),
            Cow::Borrowed,
        ),
        file: record.file_static().map_or_else(
            || Cow::Owned(record.file().unwrap_or_default().to_string()),
            Cow::Borrowed,
        ),
        function: Cow::Borrowed(""),
        line: record.line().unwrap_or_default(),
    }
}

fn dispatch_record(router: &Router, record: &log::Record) {
    Event::new(caller_of(record)).log_to(router, level_of(record.level()), record.args());
}
