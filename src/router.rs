use crate::{
    formatter::PlainTextFormatter,
    handlers::PlainTextHandler,
    util::{eprint_err, ErrorCode},
    writers::StdWriter,
    Event, HandlerError, Level, RoutingConfig,
};
use arc_swap::ArcSwapOption;
use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
};

/// The template of the handler that is used if the router was never configured.
pub const DEFAULT_TEMPLATE: &str =
    "%(level|s) [%(timestamp|s)] %(message|s) [%(.all_fields_space_separated_text|s)]";

/// Receives events from the router, renders them, and passes them on to a transport.
///
/// Implementations must not block the caller for long; batching handlers hand the event
/// over to their own background thread.
pub trait Handler: Send + Sync {
    /// Processes the event.
    ///
    /// # Errors
    ///
    /// `HandlerError` if the event could not be rendered or written.
    /// The router reports the error and continues with the next handler.
    fn handle(&self, event: &Event) -> Result<(), HandlerError>;

    /// Name that is used in failure reports.
    fn name(&self) -> &str {
        "handler"
    }

    /// Flushes pending output and stops background activities.
    fn shutdown(&self) {}
}

/// An immutable mapping from level names to ordered handler lists.
#[derive(Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<Level, Vec<Arc<dyn Handler>>>,
}
impl RoutingTable {
    /// The handlers for the given level, in registration order.
    #[must_use]
    pub fn route(&self, level: &str) -> &[Arc<dyn Handler>] {
        self.routes.get(level).map_or(&[], Vec::as_slice)
    }

    /// The levels that have at least one handler.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.routes
            .iter()
            .filter(|(_, handlers)| !handlers.is_empty())
            .map(|(level, _)| level)
    }

    fn push(&mut self, level: Level, handler: Arc<dyn Handler>) {
        self.routes.entry(level).or_default().push(handler);
    }

    // each handler once, in no particular order
    fn distinct_handlers(&self) -> Vec<Arc<dyn Handler>> {
        let mut distinct: Vec<Arc<dyn Handler>> = Vec::new();
        for handler in self.routes.values().flatten() {
            if !distinct
                .iter()
                .any(|known| std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(handler)))
            {
                distinct.push(Arc::clone(handler));
            }
        }
        distinct
    }
}
impl From<RoutingConfig> for RoutingTable {
    fn from(config: RoutingConfig) -> Self {
        let mut table = RoutingTable::default();
        for (levels, handler) in config.into_entries() {
            for level in levels {
                table.push(level, Arc::clone(&handler));
            }
        }
        table
    }
}
impl std::fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (level, handlers) in &self.routes {
            map.entry(
                level,
                &handlers.iter().map(|h| h.name()).collect::<Vec<&str>>(),
            );
        }
        map.finish()
    }
}

/// Distributes events to the handlers that are registered for the event's level.
///
/// The routing table is replaced as a whole with every change,
/// so dispatching never sees a partially updated table.
///
/// As long as no handler was registered and no configuration was loaded,
/// all events of the five standard levels are written as plain text to stdout,
/// using [`DEFAULT_TEMPLATE`].
/// Once the router is configured, events with a level that has no handlers are dropped.
///
/// Most programs use the process-wide router ([`global`](crate::global_router)),
/// which is also used by [`Event::log`](crate::Event::log).
#[derive(Default)]
pub struct Router {
    table: ArcSwapOption<RoutingTable>,
}
impl Router {
    /// Creates an unconfigured router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the handler to the handler lists of the given levels.
    pub fn add_handler(&self, levels: &[&str], handler: Arc<dyn Handler>) {
        self.table.rcu(|current| {
            let mut table = current
                .as_deref()
                .cloned()
                .unwrap_or_default();
            for level in levels {
                table.push(Level::new(level.to_string()), Arc::clone(&handler));
            }
            Some(Arc::new(table))
        });
    }

    /// Replaces the complete routing table.
    ///
    /// Levels that the configuration does not mention have no handlers afterwards.
    /// The handlers of the previous table are not shut down.
    pub fn load_config(&self, config: RoutingConfig) {
        self.table.store(Some(Arc::new(RoutingTable::from(config))));
    }

    /// The handlers that currently receive events of the given level.
    #[must_use]
    pub fn route(&self, level: &str) -> Vec<Arc<dyn Handler>> {
        match self.table.load_full() {
            Some(table) => table.route(level).to_vec(),
            None => default_table().route(level).to_vec(),
        }
    }

    /// A snapshot of the installed routing table, or `None` if the router was never configured.
    #[must_use]
    pub fn table(&self) -> Option<Arc<RoutingTable>> {
        self.table.load_full()
    }

    /// Passes the event synchronously to all handlers of its level, in registration order.
    ///
    /// Handler failures are reported on the error channel
    /// (see [`set_error_channel`](crate::set_error_channel)) and don't affect other handlers.
    pub fn dispatch(&self, event: &Event) {
        let guard = self.table.load();
        let table: &RoutingTable = match guard.as_deref() {
            Some(table) => table,
            None => default_table(),
        };
        for handler in table.route(event.level().as_str()) {
            if let Err(e) = handler.handle(event) {
                let error_code = match e {
                    HandlerError::Render(_) => ErrorCode::Render,
                    HandlerError::Write(_) => ErrorCode::Write,
                };
                eprint_err(
                    error_code,
                    &format!(
                        "handler {} failed with event {}",
                        handler.name(),
                        event.summary()
                    ),
                    &e,
                );
            }
        }
    }

    /// Shuts down every handler of the current table once,
    /// even if it is registered for several levels.
    pub fn shutdown(&self) {
        let handlers = match self.table.load_full() {
            Some(table) => table.distinct_handlers(),
            None => default_table().distinct_handlers(),
        };
        for handler in handlers {
            handler.shutdown();
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("table", &self.table.load_full())
            .finish()
    }
}

/// The process-wide router.
#[must_use]
pub fn global() -> &'static Router {
    static ROUTER: OnceLock<Router> = OnceLock::new();
    ROUTER.get_or_init(Router::new)
}

fn default_table() -> &'static RoutingTable {
    static DEFAULT_TABLE: OnceLock<RoutingTable> = OnceLock::new();
    DEFAULT_TABLE.get_or_init(|| {
        let handler: Arc<dyn Handler> = Arc::new(
            PlainTextHandler::new(
                PlainTextFormatter::new(DEFAULT_TEMPLATE).unwrap(/* template is valid */),
                StdWriter::stdout(),
            )
            .with_name("stdout"),
        );
        let mut table = RoutingTable::default();
        for level in Level::standard() {
            table.push(level, Arc::clone(&handler));
        }
        table
    })
}

#[cfg(test)]
mod test {
    use super::{Handler, Router};
    use crate::{event, HandlerError, Level, RoutingConfig, Value};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[derive(Default)]
    struct Recorder {
        name: String,
        fail: bool,
        seen: Mutex<Vec<String>>,
        shutdowns: AtomicUsize,
    }
    impl Recorder {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                ..Self::default()
            })
        }
        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail: true,
                ..Self::default()
            })
        }
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }
    impl Handler for Recorder {
        fn handle(&self, event: &crate::Event) -> Result<(), HandlerError> {
            if self.fail {
                return Err(HandlerError::Write(std::io::Error::other("broken pipe")));
            }
            self.seen.lock().unwrap().push(event.message().to_string());
            Ok(())
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn names(router: &Router, level: &str) -> Vec<String> {
        router
            .route(level)
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    #[test]
    fn test_registration_order() {
        let router = Router::new();
        let (a, b, c) = (Recorder::new("a"), Recorder::new("b"), Recorder::new("c"));
        router.add_handler(&["info", "warn"], a.clone());
        router.add_handler(&["info"], b.clone());
        router.add_handler(&["warn", "info"], c.clone());
        assert_eq!(names(&router, "info"), vec!["a", "b", "c"]);
        assert_eq!(names(&router, "warn"), vec!["a", "c"]);

        event!().log_to(&router, "info", "hello");
        assert_eq!(a.seen(), vec!["hello"]);
        assert_eq!(b.seen(), vec!["hello"]);
        assert_eq!(c.seen(), vec!["hello"]);

        // configured, but no handler for this level
        assert!(router.route("debug").is_empty());
        event!().log_to(&router, "debug", "dropped");
        assert_eq!(a.seen(), vec!["hello"]);
    }

    #[test]
    fn test_default_table() {
        let router = Router::new();
        assert!(router.table().is_none());
        for level in Level::standard() {
            assert_eq!(names(&router, level.as_str()), vec!["stdout"]);
        }
        assert!(router.route("panic").is_empty());
        assert!(router.route("trace").is_empty());
    }

    #[test]
    fn test_load_config_replaces_table() {
        let router = Router::new();
        let old = Recorder::new("old");
        router.add_handler(&["info", "error"], old.clone());

        let stdout = Recorder::new("stdout");
        let mail = Recorder::new("mail");
        router.load_config(
            RoutingConfig::new()
                .route(&["debug", "error"], stdout.clone())
                .route(&["error"], mail.clone()),
        );
        assert_eq!(names(&router, "debug"), vec!["stdout"]);
        assert_eq!(names(&router, "error"), vec!["stdout", "mail"]);
        assert!(router.route("info").is_empty());

        event!()
            .with_field("code", 7)
            .log_to(&router, "error", "disk full");
        event!().log_to(&router, "debug", "probing");
        event!().log_to(&router, "info", "dropped");
        assert_eq!(stdout.seen(), vec!["disk full", "probing"]);
        assert_eq!(mail.seen(), vec!["disk full"]);
        assert!(old.seen().is_empty());
    }

    #[test]
    fn test_failing_handler_does_not_block_others() {
        let router = Router::new();
        let broken = Recorder::failing("broken");
        let healthy = Recorder::new("healthy");
        router.add_handler(&["error"], broken.clone());
        router.add_handler(&["error"], healthy.clone());
        event!()
            .with_field("x", Value::from(1))
            .log_to(&router, "error", "still delivered");
        assert_eq!(healthy.seen(), vec!["still delivered"]);
    }

    #[test]
    fn test_shutdown_each_handler_once() {
        let router = Router::new();
        let a = Recorder::new("a");
        let b = Recorder::new("b");
        router.add_handler(&["debug", "info", "error"], a.clone());
        router.add_handler(&["error"], b.clone());
        router.shutdown();
        assert_eq!(a.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(b.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_readers_never_see_partial_tables() {
        let router = Arc::new(Router::new());
        let handlers: Vec<Arc<dyn Handler>> = (0..4)
            .map(|i| Recorder::new(&format!("h{i}")) as Arc<dyn Handler>)
            .collect();
        let config_with = |n: usize| {
            handlers
                .iter()
                .take(n)
                .fold(RoutingConfig::new(), |config, handler| {
                    config.route(&["info", "warn"], Arc::clone(handler))
                })
        };
        router.load_config(config_with(2));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let router = Arc::clone(&router);
                std::thread::spawn(move || {
                    for _ in 0..2000 {
                        let table = router.table().unwrap();
                        let info = table.route("info").len();
                        let warn = table.route("warn").len();
                        assert!(info == 2 || info == 4, "info: {info}");
                        assert_eq!(info, warn);
                    }
                })
            })
            .collect();
        for i in 0..500 {
            router.load_config(config_with(if i % 2 == 0 { 4 } else { 2 }));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
