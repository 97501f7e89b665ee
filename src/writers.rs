//! Contains the trait [`LogWriter`] for the transports that handlers write to,
//! and its concrete implementations
//! for writing to stdout or stderr ([`StdWriter`]),
//! to a single file ([`FileWriter`]),
//! to a series of time-partitioned files ([`TimeRotatedFileWriter`]),
//! or to memory ([`BufferWriter`]).
//!
//! You can also use your own implementations of [`LogWriter`].
//!
//! A handler hands the rendered event to its writer; the writer appends the line ending
//! and persists the bytes:
//!
//! ```rust
//! use fieldlog::{
//!     formatter::PlainTextFormatter, handlers::PlainTextHandler, writers::TimeRotatedFileWriter,
//! };
//! use std::{sync::Arc, time::Duration};
//!
//! let writer = TimeRotatedFileWriter::builder("log_files/app.log")
//!     .interval(Duration::from_secs(3600))
//!     .keep(Duration::from_secs(7 * 24 * 3600))
//!     .try_build()
//!     .unwrap();
//! let handler = PlainTextHandler::new(
//!     PlainTextFormatter::new("%(timestamp|s) %(level|s) %(message|s)").unwrap(),
//!     writer,
//! );
//! fieldlog::add_handler(&["info", "warn", "error"], Arc::new(handler));
//! ```

mod buffer_writer;
mod file_writer;
mod log_writer;
mod std_writer;
mod time_rotated_file_writer;

pub use self::buffer_writer::BufferWriter;
pub use self::file_writer::FileWriter;
pub use self::log_writer::LogWriter;
pub use self::std_writer::StdWriter;
pub use self::time_rotated_file_writer::{TimeRotatedFileWriter, TimeRotatedFileWriterBuilder};
