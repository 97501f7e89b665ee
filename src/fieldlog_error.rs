use thiserror::Error;

/// Describes errors in the configuration of `fieldlog`.
///
/// These errors can only occur while handlers, writers, formatters or the routing are set up;
/// the processing of log events never returns them.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FieldLogError {
    /// A reserved field key (error key, stack key) must not be empty.
    #[error("Reserved field key must not be empty")]
    EmptyKey,

    /// The event template could not be compiled.
    #[error("Invalid template: {0}")]
    Template(String),

    /// The rotation interval must be a positive number of whole seconds.
    #[error("Invalid rotation interval: {0:?}")]
    InvalidInterval(std::time::Duration),

    /// A routing specification refers to a handler name that is not registered.
    #[error("Routing refers to unknown handler {0:?}")]
    UnknownHandler(String),

    /// A mail handler needs at least one receiver.
    #[error("Mail handler has no receivers")]
    NoReceivers,

    /// Some file or directory could not be accessed.
    #[error("Log file cannot be written")]
    Io(#[from] std::io::Error),

    /// The bridge for the `log` crate could not be installed, because another logger is
    /// installed already.
    #[error("Another logger is installed already")]
    Log(#[from] log::SetLoggerError),

    /// Some synchronization object is poisoned.
    #[error("Some synchronization object is poisoned")]
    Poison,

    /// The routing specification file cannot be parsed.
    #[cfg_attr(docsrs, doc(cfg(feature = "specfile")))]
    #[cfg(feature = "specfile")]
    #[error("Routing specification cannot be parsed")]
    Toml(#[from] toml::de::Error),
}

/// Describes why a single log event could not be rendered.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RenderError {
    /// A placeholder's format hint does not fit to the type of the field value.
    #[error("field {name:?} cannot be rendered with hint {hint:?}")]
    HintMismatch {
        /// Name of the placeholder.
        name: String,
        /// The format hint that was used.
        hint: char,
    },

    /// Serialization to JSON failed, e.g. because a field value is opaque.
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    #[cfg(feature = "json")]
    #[error("serialization to JSON failed")]
    Json(#[from] serde_json::Error),
}

/// Describes why a handler could not process a log event.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The event could not be rendered.
    #[error("rendering failed")]
    Render(#[from] RenderError),

    /// The rendered output could not be written to its transport.
    #[error("writing failed")]
    Write(#[from] std::io::Error),
}
