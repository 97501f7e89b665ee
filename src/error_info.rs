//! Error codes of `fieldlog`.
//!
//! Failures that occur while a log event is processed are never returned to the code that
//! issued the log call. They are printed to the [`ErrorChannel`](crate::ErrorChannel)
//! instead, with one of the following error codes, and processing continues.
//!
//! ## `Render`
//!
//! A handler could not render an event, so this handler dropped it.
//!
//! Example:
//!
//! ```text
//! [fieldlog][ERRCODE::Render] handler json failed with event (level=error, message="..."), caused by ...
//! ```
//!
//! Typical reasons are a field with an opaque value that is sent to a JSON handler,
//! or a template placeholder with hint `d` that refers to a non-numeric field.
//!
//! ## `Write`
//!
//! The rendered output could not be written to the handler's writer.
//! The other handlers that are routed for the same level still receive the event.
//!
//! ## `Rotate`
//!
//! A [`TimeRotatedFileWriter`](crate::writers::TimeRotatedFileWriter) could not rename the
//! live file to its partition name, or could not start its rotation thread.
//! The writer keeps writing to its previous file handle.
//!
//! ## `Cleanup`
//!
//! The retention cleanup of a `TimeRotatedFileWriter` could not list the log directory,
//! could not parse the timestamp of a partition file, or could not remove an expired
//! partition. Only the offending file is skipped.
//!
//! ## `Mail`
//!
//! A [`MailHandler`](crate::handlers::MailHandler) could not render or send an aggregated batch.
//! This batch is dropped; it is not retried.
//!
//! ## `Poison`
//!
//! Log events can be produced by all threads of your program, so the mutable parts of
//! `fieldlog` are kept in `Mutex`es. In case that a thread panics while owning one of these
//! locks, the lock is subsequently considered "poisoned".
//!
//! ## `Abort`
//!
//! An event was logged with [`Event::log_and_abort`](crate::Event::log_and_abort) or
//! [`Event::panic`](crate::Event::panic); the process is terminated after the event was
//! dispatched and all handlers were shut down.
