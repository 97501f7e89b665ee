// only enables the `doc_cfg` feature when the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::unused_self)]
#![allow(clippy::module_name_repetitions)]
//! A structured logger: log events carry key/value fields,
//! and are routed by their level to any number of handlers,
//! which render and write them independently.
//!
//! ```rust
//! use fieldlog::{event, Session};
//!
//! fieldlog::set_global_field("service", "billing");
//!
//! let session = Session::new().with_field("request_id", 4711);
//! event!(session)
//!     .with_field("amount", 12.5)
//!     .info("invoice created");
//! ```
//!
//! As long as nothing is configured, the events of the standard levels
//! `debug`, `info`, `warn`, `error` and `fatal` are written as plain text to stdout.
//! Levels are open strings though, you can use any level names you like.
//!
//! See
//!
//! * [`Event`] and [`Session`] for creating events,
//! * [`Router`] for how events are distributed,
//! * the module [`handlers`] for the available handlers, among them the aggregating
//!   [`MailHandler`](handlers::MailHandler),
//! * the module [`formatter`] for the rendering of events, including the [`Template`] syntax,
//! * the module [`writers`] for the transports, among them the
//!   [`TimeRotatedFileWriter`](writers::TimeRotatedFileWriter),
//! * [`RoutingConfig`] and `RoutingSpec` for configuring the routing in one step.
//!
//! Failures during the processing of events never reach the logging call;
//! they are reported on the error channel (see [`set_error_channel`] and [`error_info`]).

mod config;
mod event;
mod fieldlog_error;
mod globals;
mod log_bridge;
mod router;
mod session;
mod template;
mod threads;
mod util;
mod value;

pub mod error_info;
pub mod formatter;
pub mod handlers;
pub mod writers;

#[cfg(feature = "specfile")]
pub use crate::config::RoutingSpec;
pub use crate::config::RoutingConfig;
#[doc(hidden)]
pub use crate::event::trim_function_name;
pub use crate::event::{Caller, Event, Level, DEFAULT_TIMESTAMP_FORMAT};
pub use crate::fieldlog_error::{FieldLogError, HandlerError, RenderError};
pub use crate::globals::{
    clear_global_fields, global_fields, set_error_key, set_global_field, set_global_fields,
    set_stack_key,
};
pub use crate::log_bridge::{init_log_bridge, LogBridge};
pub use crate::router::{global as global_router, Handler, Router, RoutingTable, DEFAULT_TEMPLATE};
pub use crate::session::Session;
pub use crate::template::Template;
pub use crate::util::{set_error_channel, ErrorChannel};
pub use crate::value::{Fields, Value};

use std::sync::Arc;

/// Appends the handler to the given levels of the process-wide router.
///
/// See [`Router::add_handler`].
pub fn add_handler(levels: &[&str], handler: Arc<dyn Handler>) {
    router::global().add_handler(levels, handler);
}

/// Replaces the routing of the process-wide router.
///
/// See [`Router::load_config`].
pub fn load_config(config: RoutingConfig) {
    router::global().load_config(config);
}

/// Shuts down all handlers of the process-wide router.
///
/// Call this before the program ends, so that pending mail batches are sent
/// and rotation threads are stopped.
pub fn shutdown() {
    router::global().shutdown();
}
