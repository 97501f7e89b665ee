use crate::{Caller, Event, Fields, Level, Value};
use std::{fmt, sync::Arc};

/// A set of fields that belong to a unit of work, e.g. a request or a connection,
/// and that are attached to every event created from the session.
///
/// Cloning a session is cheap; the fields are shared until one of the clones is modified.
///
/// ```rust
/// use fieldlog::{event, Session};
///
/// let session = Session::new()
///     .with_field("request_id", 4711)
///     .with_field("peer", "10.0.0.7");
/// event!(session).info("request accepted");
/// event!(session).with_field("status", 200).info("request done");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Session {
    fields: Arc<Fields>,
}
impl Session {
    /// Creates a session without fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the session.
    #[must_use]
    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        Arc::make_mut(&mut self.fields).insert(key.into(), value.into());
        self
    }

    /// Adds multiple fields to the session.
    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        Arc::make_mut(&mut self.fields).extend(fields);
        self
    }

    /// The session's fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Creates an event that carries the session's fields.
    ///
    /// Use the [`event!`](crate::event) macro to fill in the caller automatically.
    #[must_use]
    pub fn event(&self, caller: Caller) -> Event {
        Event::with_session(caller, Arc::clone(&self.fields))
    }

    /// Creates and logs an event in one step.
    pub fn log<L: Into<Level>, M: fmt::Display>(&self, caller: Caller, level: L, message: M) {
        self.event(caller).log(level, message);
    }
}
