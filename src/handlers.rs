//! Contains the implementations of [`Handler`](crate::Handler) that come with `fieldlog`.
//!
//! [`PlainTextHandler`] and [`JsonHandler`] render each event on its own
//! and write it synchronously to a [`LogWriter`](crate::writers::LogWriter).
//! [`MailHandler`] collects the events that arrive within a time window and sends them
//! as one mail through a [`MailTransport`].

#[cfg(feature = "json")]
mod json_handler;
mod mail_handler;
mod mail_transport;
mod plain_text_handler;

#[cfg(feature = "json")]
pub use self::json_handler::JsonHandler;
pub use self::mail_handler::{MailHandler, MailHandlerBuilder};
pub use self::mail_transport::{MailTransport, SendmailTransport};
pub use self::plain_text_handler::PlainTextHandler;
