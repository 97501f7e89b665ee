use crate::{
    globals::{error_key, global_fields, stack_key},
    router::{self, Router},
    util::{eprint_msg, ErrorCode},
    value::{Fields, Value},
};
use chrono::{DateTime, Local};
use std::{borrow::Cow, fmt, path::Path, sync::Arc};

/// Default timestamp format of rendered events (RFC 3339 with seconds precision).
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// The level of an event.
///
/// Levels are an open set of names; the constants cover the standard ones.
/// Routing compares levels by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(Cow<'static, str>);
impl Level {
    /// `debug`
    pub const DEBUG: Level = Level(Cow::Borrowed("debug"));
    /// `info`
    pub const INFO: Level = Level(Cow::Borrowed("info"));
    /// `warn`
    pub const WARN: Level = Level(Cow::Borrowed("warn"));
    /// `error`
    pub const ERROR: Level = Level(Cow::Borrowed("error"));
    /// `fatal`
    pub const FATAL: Level = Level(Cow::Borrowed("fatal"));
    /// `panic`; used by [`Event::panic`].
    pub const PANIC: Level = Level(Cow::Borrowed("panic"));

    /// Creates a level with an arbitrary name.
    #[must_use]
    pub fn new<S: Into<Cow<'static, str>>>(name: S) -> Self {
        Self(name.into())
    }

    /// The five standard levels, from `debug` to `fatal`.
    #[must_use]
    pub fn standard() -> [Level; 5] {
        [Self::DEBUG, Self::INFO, Self::WARN, Self::ERROR, Self::FATAL]
    }

    /// The name of the level.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl std::borrow::Borrow<str> for Level {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl From<&'static str> for Level {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}
impl From<String> for Level {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}
impl From<&Level> for Level {
    fn from(l: &Level) -> Self {
        l.clone()
    }
}

/// Describes the code location that issued an event.
///
/// Usually created with the [`caller!`](crate::caller) macro.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Caller {
    /// Module path, e.g. `my_prog::server`.
    pub module: Cow<'static, str>,
    /// Source file as given by `file!()`.
    pub file: Cow<'static, str>,
    /// Name of the enclosing function, without its path.
    pub function: Cow<'static, str>,
    /// Line number.
    pub line: u32,
}
impl Caller {
    /// Constructor.
    #[must_use]
    pub fn new(
        module: &'static str,
        file: &'static str,
        line: u32,
        function: &'static str,
    ) -> Self {
        Self {
            module: Cow::Borrowed(module),
            file: Cow::Borrowed(file),
            function: Cow::Borrowed(function),
            line,
        }
    }

    /// The file name without directories.
    #[must_use]
    pub fn file_name(&self) -> &str {
        Path::new(&*self.file)
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or(&*self.file)
    }
}

#[doc(hidden)]
#[must_use]
pub fn trim_function_name(name: &'static str) -> &'static str {
    let mut name = name.strip_suffix("::f").unwrap_or(name);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// A log event.
///
/// An event is created for a single log call, e.g. with the [`event!`](crate::event) macro,
/// can be enriched with fields, and is consumed when it is logged:
///
/// ```rust
/// fieldlog::event!()
///     .with_field("user", "alice")
///     .with_field("attempt", 3)
///     .warn("login failed");
/// ```
#[derive(Clone, Debug)]
pub struct Event {
    timestamp: DateTime<Local>,
    level: Level,
    message: String,
    caller: Caller,
    session: Arc<Fields>,
    fields: Fields,
}
impl Event {
    /// Creates an event without session fields.
    #[must_use]
    pub fn new(caller: Caller) -> Self {
        Self::with_session(caller, Arc::new(Fields::new()))
    }

    /// Creates an event that carries the given session fields.
    #[must_use]
    pub fn with_session(caller: Caller, session: Arc<Fields>) -> Self {
        Self {
            timestamp: Local::now(),
            level: Level::default(),
            message: String::new(),
            caller,
            session,
            fields: Fields::new(),
        }
    }

    /// Adds a field to the event.
    #[must_use]
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds multiple fields to the event.
    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Adds the text of the error as field, by default with key `error`
    /// (see [`set_error_key`](crate::set_error_key)).
    #[must_use]
    pub fn with_error(self, err: &dyn std::error::Error) -> Self {
        self.with_field(error_key(), err.to_string())
    }

    /// Creation time of the event.
    #[must_use]
    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }
    /// The level; empty until the event is logged.
    #[must_use]
    pub fn level(&self) -> &Level {
        &self.level
    }
    /// The message; empty until the event is logged.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
    /// The code location that created the event.
    #[must_use]
    pub fn caller(&self) -> &Caller {
        &self.caller
    }
    /// The session fields.
    #[must_use]
    pub fn session_fields(&self) -> &Fields {
        &self.session
    }
    /// The event's own fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Global, session and event fields in one map; on key collisions,
    /// event fields win over session fields, which win over global fields.
    #[must_use]
    pub fn merged_fields(&self) -> Fields {
        self.merged_fields_with(&global_fields())
    }

    pub(crate) fn merged_fields_with(&self, globals: &Fields) -> Fields {
        let mut merged =
            Fields::with_capacity(globals.len() + self.session.len() + self.fields.len() + 8);
        for layer in [globals, &*self.session, &self.fields] {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// The merged fields plus the event attributes
    /// `timestamp` (formatted with the given chrono format string), `level`, `message`,
    /// `caller.module`, `caller.file`, `caller.func` and `caller.line`.
    #[must_use]
    pub fn fieldify(&self, timestamp_format: &str) -> Fields {
        self.fieldify_with(&global_fields(), timestamp_format)
    }

    pub(crate) fn fieldify_with(&self, globals: &Fields, timestamp_format: &str) -> Fields {
        let mut fields = self.merged_fields_with(globals);
        fields.insert(
            "timestamp".to_string(),
            Value::Str(format_timestamp(&self.timestamp, timestamp_format)),
        );
        fields.insert("level".to_string(), Value::from(self.level.as_str()));
        fields.insert("message".to_string(), Value::from(self.message.as_str()));
        fields.insert(
            "caller.module".to_string(),
            Value::from(&*self.caller.module),
        );
        fields.insert(
            "caller.file".to_string(),
            Value::from(self.caller.file_name()),
        );
        fields.insert(
            "caller.func".to_string(),
            Value::from(&*self.caller.function),
        );
        fields.insert("caller.line".to_string(), Value::from(self.caller.line));
        fields
    }

    // short description for failure reports
    pub(crate) fn summary(&self) -> String {
        format!("(level={}, message={:?})", self.level, self.message)
    }

    /// Logs the event with the given level through the process-wide router.
    pub fn log<L: Into<Level>, M: fmt::Display>(self, level: L, message: M) {
        self.log_to(router::global(), level, message);
    }

    /// Logs the event with the given level through the given router.
    pub fn log_to<L: Into<Level>, M: fmt::Display>(
        mut self,
        router: &Router,
        level: L,
        message: M,
    ) {
        self.level = level.into();
        self.message = message.to_string();
        router.dispatch(&self);
    }

    /// Logs the event with level `debug`.
    pub fn debug<M: fmt::Display>(self, message: M) {
        self.log(Level::DEBUG, message);
    }
    /// Logs the event with level `info`.
    pub fn info<M: fmt::Display>(self, message: M) {
        self.log(Level::INFO, message);
    }
    /// Logs the event with level `warn`.
    pub fn warn<M: fmt::Display>(self, message: M) {
        self.log(Level::WARN, message);
    }
    /// Logs the event with level `error`.
    pub fn error<M: fmt::Display>(self, message: M) {
        self.log(Level::ERROR, message);
    }
    /// Logs the event with level `fatal`.
    ///
    /// The program continues; use [`Event::log_and_abort`] to terminate it.
    pub fn fatal<M: fmt::Display>(self, message: M) {
        self.log(Level::FATAL, message);
    }

    /// Logs the event, then terminates the process.
    ///
    /// The event is dispatched synchronously to all handlers of its level; then all routed
    /// handlers are shut down, so that pending mail batches are sent and rotation threads
    /// are stopped, and finally the process exits with code 1.
    pub fn log_and_abort<L: Into<Level>, M: fmt::Display>(mut self, level: L, message: M) -> ! {
        let router = router::global();
        self.level = level.into();
        self.message = message.to_string();
        router.dispatch(&self);
        router.shutdown();
        eprint_msg(
            ErrorCode::Abort,
            &format!("terminating the process after event {}", self.summary()),
        );
        std::process::exit(1)
    }

    /// Logs the event with level `panic` and the current stack trace as field,
    /// then terminates the process like [`Event::log_and_abort`].
    pub fn panic<M: fmt::Display>(self, message: M) -> ! {
        let stack = std::backtrace::Backtrace::force_capture().to_string();
        self.with_field(stack_key(), stack)
            .log_and_abort(Level::PANIC, message)
    }
}

pub(crate) fn format_timestamp(timestamp: &DateTime<Local>, format: &str) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(32);
    if write!(s, "{}", timestamp.format(format)).is_err() {
        s.clear();
    }
    s
}

pub(crate) fn is_valid_timestamp_format(format: &str) -> bool {
    !chrono::format::StrftimeItems::new(format)
        .any(|item| matches!(item, chrono::format::Item::Error))
}

/// Creates a [`Caller`] describing the current code location.
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(
            ::std::module_path!(),
            ::std::file!(),
            ::std::line!(),
            $crate::__function_name!(),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::trim_function_name(type_name_of(f))
    }};
}

/// Creates an [`Event`] for the current code location.
///
/// Without argument, the event carries no session fields;
/// with a [`Session`](crate::Session) as argument, it carries the session's fields.
///
/// ```rust
/// let session = fieldlog::Session::new().with_field("request", 4711);
/// fieldlog::event!(session).with_field("status", 404).info("not found");
/// fieldlog::event!().debug("done");
/// ```
#[macro_export]
macro_rules! event {
    () => {
        $crate::Event::new($crate::caller!())
    };
    ($session:expr) => {
        ($session).event($crate::caller!())
    };
}
