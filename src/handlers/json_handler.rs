use crate::{
    formatter::{EventFormatter, JsonFormatter},
    writers::LogWriter,
    Event, Handler, HandlerError,
};

/// Writes each event as a JSON object on its own line.
///
/// Events with fields that cannot be serialized (opaque values) are reported as render failures
/// and not written.
pub struct JsonHandler {
    name: String,
    formatter: JsonFormatter,
    writer: Box<dyn LogWriter>,
}
impl JsonHandler {
    /// Uses a [`JsonFormatter`] with the default timestamp format.
    pub fn new<W: LogWriter + 'static>(writer: W) -> Self {
        Self {
            name: "json".to_string(),
            formatter: JsonFormatter::default(),
            writer: Box::new(writer),
        }
    }

    /// Replaces the formatter, e.g. to use a different timestamp format.
    #[must_use]
    pub fn with_formatter(mut self, formatter: JsonFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Sets the name that is used in failure reports.
    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }
}
impl Handler for JsonHandler {
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
    use super::JsonHandler;
    use crate::{writers::BufferWriter, Handler, HandlerError, Value};

    #[test]
    fn test_json_lines() {
        let writer = BufferWriter::new();
        let handler = JsonHandler::new(writer.clone());
        let event = crate::event!().with_field("user", "bob").with_field("n", 2);
        handler.handle(&event).unwrap();

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed["user"], "bob");
        assert_eq!(parsed["n"], 2);
    }

    #[test]
    fn test_opaque_value_is_a_render_failure() {
        let writer = BufferWriter::new();
        let handler = JsonHandler::new(writer.clone());
        let event = crate::event!().with_field("handle", Value::opaque(std::time::Instant::now()));
        assert!(matches!(handler.handle(&event), Err(HandlerError::Render(_))));
        assert!(writer.content().is_empty());
    }
}
