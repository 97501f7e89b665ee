use crate::{formatter::EventFormatter, writers::LogWriter, Event, Handler, HandlerError};

/// Renders each event with an [`EventFormatter`] and writes the result to a [`LogWriter`].
///
/// Typically used with a [`PlainTextFormatter`](crate::formatter::PlainTextFormatter),
/// but any single-event formatter can be used.
pub struct PlainTextHandler {
    name: String,
    formatter: Box<dyn EventFormatter>,
    writer: Box<dyn LogWriter>,
}
impl PlainTextHandler {
    /// Combines formatter and writer.
    pub fn new<F, W>(formatter: F, writer: W) -> Self
    where
        F: EventFormatter + 'static,
        W: LogWriter + 'static,
    {
        Self {
            name: "plain_text".to_string(),
            formatter: Box::new(formatter),
            writer: Box::new(writer),
        }
    }

    /// Sets the name that is used in failure reports.
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }
}
impl Handler for PlainTextHandler {
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let rendered = self.formatter.format_event(event)?;
        self.writer.write(&rendered)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&self) {
        self.writer.flush().ok();
        self.writer.shutdown();
    }
}

#[cfg(test)]
mod test {
    use super::PlainTextHandler;
    use crate::{
        formatter::PlainTextFormatter, writers::BufferWriter, Handler, HandlerError, RenderError,
    };

    #[test]
    fn test_render_and_write() {
        let writer = BufferWriter::new();
        let handler = PlainTextHandler::new(
            PlainTextFormatter::new("%(level|s): %(message|s) n=%(n|d)").unwrap(),
            writer.clone(),
        );
        let router = crate::Router::new();
        router.add_handler(&["info"], std::sync::Arc::new(handler));
        crate::event!().with_field("n", 3).log_to(&router, "info", "one");
        crate::event!().log_to(&router, "info", "two");
        assert_eq!(writer.lines(), vec!["info: one n=3", "info: two n="]);
    }

    #[test]
    fn test_render_failure() {
        let writer = BufferWriter::new();
        let handler = PlainTextHandler::new(
            PlainTextFormatter::new("%(n|d)").unwrap(),
            writer.clone(),
        );
        let event = crate::event!().with_field("n", "not a number");
        assert!(matches!(
            handler.handle(&event),
            Err(HandlerError::Render(RenderError::HintMismatch { .. }))
        ));
        assert!(writer.lines().is_empty());
    }
}
