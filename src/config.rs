use crate::{Handler, Level};
use std::sync::Arc;

#[cfg(feature = "specfile")]
use {
    crate::FieldLogError,
    serde_derive::Deserialize,
    std::collections::{BTreeMap, HashMap},
};

/// The complete routing of a [`Router`](crate::Router), to be installed in one step with
/// [`Router::load_config`](crate::Router::load_config).
///
/// The handlers of a level receive events in the order in which they were added.
///
/// ```rust
/// use fieldlog::{
///     formatter::PlainTextFormatter, handlers::PlainTextHandler, writers::StdWriter, RoutingConfig,
/// };
/// use std::sync::Arc;
///
/// let stdout = Arc::new(PlainTextHandler::new(
///     PlainTextFormatter::new("%(level|s) %(message|s)").unwrap(),
///     StdWriter::stdout(),
/// ));
/// let config = RoutingConfig::new().route(&["info", "warn", "error"], stdout);
/// fieldlog::global_router().load_config(config);
/// ```
#[derive(Clone, Default)]
pub struct RoutingConfig {
    entries: Vec<(Vec<Level>, Arc<dyn Handler>)>,
}
impl RoutingConfig {
    /// An empty configuration; all events are dropped by a router that loaded it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the handler to the given levels.
    #[must_use]
    pub fn route(mut self, levels: &[&str], handler: Arc<dyn Handler>) -> Self {
        self.entries.push((
            levels.iter().map(|l| Level::new(l.to_string())).collect(),
            handler,
        ));
        self
    }

    /// Adds the handler to the given levels.
    #[must_use]
    pub fn route_levels(mut self, levels: Vec<Level>, handler: Arc<dyn Handler>) -> Self {
        self.entries.push((levels, handler));
        self
    }

    pub(crate) fn into_entries(self) -> Vec<(Vec<Level>, Arc<dyn Handler>)> {
        self.entries
    }
}
impl std::fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(levels, h)| (levels, h.name())))
            .finish()
    }
}

/// A declarative routing, mapping level names to lists of handler names.
///
/// The handler names are resolved against a registry of named handlers:
///
/// ```rust
/// use fieldlog::{formatter::PlainTextFormatter, handlers::PlainTextHandler, writers::StdWriter};
/// use fieldlog::{Handler, RoutingSpec};
/// use std::{collections::HashMap, sync::Arc};
///
/// let spec = RoutingSpec::from_toml(
///     r#"
///     [levels]
///     debug = ["stdout"]
///     error = ["stdout", "stderr"]
///     "#,
/// )
/// .unwrap();
///
/// let format = "%(level|s) %(message|s)";
/// let mut registry: HashMap<String, Arc<dyn Handler>> = HashMap::new();
/// registry.insert(
///     "stdout".to_string(),
///     Arc::new(PlainTextHandler::new(
///         PlainTextFormatter::new(format).unwrap(),
///         StdWriter::stdout(),
///     )),
/// );
/// registry.insert(
///     "stderr".to_string(),
///     Arc::new(PlainTextHandler::new(
///         PlainTextFormatter::new(format).unwrap(),
///         StdWriter::stderr(),
///     )),
/// );
/// fieldlog::global_router().load_config(spec.resolve(&registry).unwrap());
/// ```
#[cfg_attr(docsrs, doc(cfg(feature = "specfile")))]
#[cfg(feature = "specfile")]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RoutingSpec {
    #[serde(default)]
    levels: BTreeMap<String, Vec<String>>,
}

#[cfg(feature = "specfile")]
impl RoutingSpec {
    /// Parses a routing specification in TOML format.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Toml` if the text is not a valid specification.
    pub fn from_toml<S: AsRef<str>>(s: S) -> Result<Self, FieldLogError> {
        Ok(toml::from_str(s.as_ref())?)
    }

    /// Reads and parses a routing specification file in TOML format.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Io` if the file cannot be read,
    /// `FieldLogError::Toml` if the content is not a valid specification.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, FieldLogError> {
        Self::from_toml(std::fs::read_to_string(path)?)
    }

    /// The handler names per level.
    #[must_use]
    pub fn levels(&self) -> &BTreeMap<String, Vec<String>> {
        &self.levels
    }

    /// Builds the routing configuration by looking up each handler name in the registry.
    ///
    /// # Errors
    ///
    /// `FieldLogError::UnknownHandler` if a name is not contained in the registry.
    pub fn resolve(
        &self,
        registry: &HashMap<String, Arc<dyn Handler>>,
    ) -> Result<RoutingConfig, FieldLogError> {
        let mut config = RoutingConfig::new();
        for (level, names) in &self.levels {
            for name in names {
                let handler = registry
                    .get(name)
                    .ok_or_else(|| FieldLogError::UnknownHandler(name.clone()))?;
                config = config.route_levels(vec![Level::new(level.clone())], Arc::clone(handler));
            }
        }
        Ok(config)
    }
}
