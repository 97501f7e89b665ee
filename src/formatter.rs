//! Renderers that turn events into bytes.
//!
//! Single-event handlers like [`PlainTextHandler`](crate::handlers::PlainTextHandler)
//! use an [`EventFormatter`], batching handlers like
//! [`MailHandler`](crate::handlers::MailHandler) use a [`MultiEventFormatter`].
use crate::{
    event::{is_valid_timestamp_format, DEFAULT_TIMESTAMP_FORMAT},
    globals::global_fields,
    value::join_fields,
    Event, FieldLogError, Fields, RenderError, Template, Value,
};
#[cfg(feature = "colors")]
use std::collections::HashMap;

/// Renders a single event.
pub trait EventFormatter: Send + Sync {
    /// Renders the event, without line ending.
    ///
    /// # Errors
    ///
    /// `RenderError` if the event cannot be rendered.
    fn format_event(&self, event: &Event) -> Result<Vec<u8>, RenderError>;
}

/// Renders a batch of events into one text.
pub trait MultiEventFormatter: Send + Sync {
    /// Renders each event on its own line, in the given order; every line is terminated
    /// with `\n`.
    ///
    /// # Errors
    ///
    /// `RenderError` if one of the events cannot be rendered.
    fn format_events(&self, events: &[Event]) -> Result<Vec<u8>, RenderError>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Scope {
    Event,
    Session,
    Global,
    All,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Listing {
    scope: Scope,
    separator: &'static str,
    key: &'static str,
}

// the derived field listings a template can refer to
const LISTINGS: [Listing; 8] = [
    Listing {
        scope: Scope::Event,
        separator: " ",
        key: ".event_fields_space_separated_text",
    },
    Listing {
        scope: Scope::Event,
        separator: ",",
        key: ".event_fields_comma_separated_text",
    },
    Listing {
        scope: Scope::Session,
        separator: " ",
        key: ".session_fields_space_separated_text",
    },
    Listing {
        scope: Scope::Session,
        separator: ",",
        key: ".session_fields_comma_separated_text",
    },
    Listing {
        scope: Scope::Global,
        separator: " ",
        key: ".global_fields_space_separated_text",
    },
    Listing {
        scope: Scope::Global,
        separator: ",",
        key: ".global_fields_comma_separated_text",
    },
    Listing {
        scope: Scope::All,
        separator: " ",
        key: ".all_fields_space_separated_text",
    },
    Listing {
        scope: Scope::All,
        separator: ",",
        key: ".all_fields_comma_separated_text",
    },
];

/// Renders events with a [`Template`].
///
/// Besides the event's fields and the attributes provided by [`Event::fieldify`],
/// the template can use derived listings of fields, like `a=1 b="x"`:
///
/// | placeholder name | content |
/// |---|---|
/// | `.event_fields_space_separated_text`, `.event_fields_comma_separated_text` | the event's own fields |
/// | `.session_fields_space_separated_text`, `.session_fields_comma_separated_text` | the session fields |
/// | `.global_fields_space_separated_text`, `.global_fields_comma_separated_text` | the global fields |
/// | `.all_fields_space_separated_text`, `.all_fields_comma_separated_text` | global, session and event listing, in this order |
///
/// A listing is only computed if the template refers to it.
/// Its entries are unordered unless [`sort_fields`](PlainTextFormatterBuilder::sort_fields)
/// is set.
///
/// ```rust
/// use fieldlog::formatter::PlainTextFormatter;
/// let formatter = PlainTextFormatter::builder(
///     "%(level|s) [%(timestamp|s)] %(message|s) [%(.all_fields_space_separated_text|s)]",
/// )
/// .sort_fields(true)
/// .try_build()
/// .unwrap();
/// ```
#[derive(Debug)]
pub struct PlainTextFormatter {
    template: Template,
    timestamp_format: String,
    sort_fields: bool,
    listings: Vec<Listing>,
    #[cfg(feature = "colors")]
    level_styles: HashMap<String, nu_ansi_term::Style>,
}

/// Builder for [`PlainTextFormatter`].
pub struct PlainTextFormatterBuilder {
    template: String,
    timestamp_format: String,
    sort_fields: bool,
    #[cfg(feature = "colors")]
    level_styles: HashMap<String, nu_ansi_term::Style>,
}
impl PlainTextFormatterBuilder {
    /// Chrono format string for the `timestamp` field; default is RFC 3339.
    #[must_use]
    pub fn timestamp_format<S: Into<String>>(mut self, format: S) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Sorts the entries of field listings by their rendered `key=value` text.
    #[must_use]
    pub fn sort_fields(mut self, sort: bool) -> Self {
        self.sort_fields = sort;
        self
    }

    /// Renders the `level` field of events with the given level in the given color.
    #[cfg_attr(docsrs, doc(cfg(feature = "colors")))]
    #[cfg(feature = "colors")]
    #[must_use]
    pub fn level_color<S: Into<String>>(mut self, level: S, color: nu_ansi_term::Color) -> Self {
        self.level_styles.insert(level.into(), color.normal());
        self
    }

    /// Produces the formatter.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Template` if the template or the timestamp format is invalid.
    pub fn try_build(self) -> Result<PlainTextFormatter, FieldLogError> {
        if !is_valid_timestamp_format(&self.timestamp_format) {
            return Err(FieldLogError::Template(format!(
                "invalid timestamp format {:?}",
                self.timestamp_format
            )));
        }
        let template = Template::compile(self.template)?;
        // not exact, but good enough to avoid computing listings nobody uses
        let listings = LISTINGS
            .iter()
            .filter(|listing| {
                template
                    .source()
                    .contains(&format!("%({}|", listing.key))
            })
            .copied()
            .collect();
        Ok(PlainTextFormatter {
            template,
            timestamp_format: self.timestamp_format,
            sort_fields: self.sort_fields,
            listings,
            #[cfg(feature = "colors")]
            level_styles: self.level_styles,
        })
    }
}

impl PlainTextFormatter {
    /// Starts building a formatter for the given template (see [`Template`]).
    #[must_use]
    pub fn builder<S: Into<String>>(template: S) -> PlainTextFormatterBuilder {
        PlainTextFormatterBuilder {
            template: template.into(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            sort_fields: false,
            #[cfg(feature = "colors")]
            level_styles: HashMap::new(),
        }
    }

    /// A formatter with the given template and default settings.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Template` if the template is invalid.
    pub fn new<S: Into<String>>(template: S) -> Result<Self, FieldLogError> {
        Self::builder(template).try_build()
    }

    #[cfg(test)]
    fn needs(&self, key: &str) -> bool {
        self.listings.iter().any(|listing| listing.key == key)
    }

    fn listing(&self, listing: &Listing, event: &Event, globals: &Fields) -> String {
        let join = |fields: &Fields| join_fields(fields, "=", listing.separator, self.sort_fields);
        match listing.scope {
            Scope::Event => join(event.fields()),
            Scope::Session => join(event.session_fields()),
            Scope::Global => join(globals),
            Scope::All => [join(globals), join(event.session_fields()), join(event.fields())]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<String>>()
                .join(listing.separator),
        }
    }

    fn fieldify(&self, event: &Event, globals: &Fields) -> Fields {
        let mut fields = event.fieldify_with(globals, &self.timestamp_format);
        for listing in &self.listings {
            fields.insert(
                listing.key.to_string(),
                Value::Str(self.listing(listing, event, globals)),
            );
        }
        #[cfg(feature = "colors")]
        if let Some(style) = self.level_styles.get(event.level().as_str()) {
            fields.insert(
                "level".to_string(),
                Value::Str(style.paint(event.level().as_str()).to_string()),
            );
        }
        fields
    }

    fn format_with(
        &self,
        event: &Event,
        globals: &Fields,
        out: &mut Vec<u8>,
    ) -> Result<(), RenderError> {
        self.template.render_into(&self.fieldify(event, globals), out)
    }
}

impl EventFormatter for PlainTextFormatter {
    fn format_event(&self, event: &Event) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::with_capacity(200);
        self.format_with(event, &global_fields(), &mut out)?;
        Ok(out)
    }
}

impl MultiEventFormatter for PlainTextFormatter {
    fn format_events(&self, events: &[Event]) -> Result<Vec<u8>, RenderError> {
        let globals = global_fields();
        let mut out = Vec::with_capacity(200 * events.len());
        for event in events {
            self.format_with(event, &globals, &mut out)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// Renders events as JSON objects.
///
/// The object contains the merged fields, `timestamp`, `level`, `message`, and
/// `caller` as nested object with `module`, `file`, `func` and `line`.
/// Events with [opaque](crate::Value::Opaque) field values cannot be rendered.
#[cfg_attr(docsrs, doc(cfg(feature = "json")))]
#[cfg(feature = "json")]
#[derive(Debug)]
pub struct JsonFormatter {
    timestamp_format: String,
}
#[cfg(feature = "json")]
impl Default for JsonFormatter {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}
#[cfg(feature = "json")]
impl JsonFormatter {
    /// A formatter that renders timestamps with the given chrono format string.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Template` if the timestamp format is invalid.
    pub fn with_timestamp_format<S: Into<String>>(format: S) -> Result<Self, FieldLogError> {
        let timestamp_format = format.into();
        if is_valid_timestamp_format(&timestamp_format) {
            Ok(Self { timestamp_format })
        } else {
            Err(FieldLogError::Template(format!(
                "invalid timestamp format {timestamp_format:?}"
            )))
        }
    }

    fn format_with(
        &self,
        event: &Event,
        globals: &Fields,
        out: &mut Vec<u8>,
    ) -> Result<(), RenderError> {
        use std::collections::BTreeMap;
        let mut object: BTreeMap<String, Value> =
            event.merged_fields_with(globals).into_iter().collect();
        let caller = event.caller();
        let mut caller_object = BTreeMap::new();
        caller_object.insert("module".to_string(), Value::from(&*caller.module));
        caller_object.insert("file".to_string(), Value::from(caller.file_name()));
        caller_object.insert("func".to_string(), Value::from(&*caller.function));
        caller_object.insert("line".to_string(), Value::from(caller.line));
        object.insert("caller".to_string(), Value::Map(caller_object));
        object.insert(
            "timestamp".to_string(),
            Value::Str(crate::event::format_timestamp(
                event.timestamp(),
                &self.timestamp_format,
            )),
        );
        object.insert("level".to_string(), Value::from(event.level().as_str()));
        object.insert("message".to_string(), Value::from(event.message()));
        serde_json::to_writer(out, &object)?;
        Ok(())
    }
}
#[cfg(feature = "json")]
impl EventFormatter for JsonFormatter {
    fn format_event(&self, event: &Event) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::with_capacity(200);
        self.format_with(event, &global_fields(), &mut out)?;
        Ok(out)
    }
}
#[cfg(feature = "json")]
impl MultiEventFormatter for JsonFormatter {
    fn format_events(&self, events: &[Event]) -> Result<Vec<u8>, RenderError> {
        let globals = global_fields();
        let mut out = Vec::with_capacity(200 * events.len());
        for event in events {
            self.format_with(event, &globals, &mut out)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::PlainTextFormatter;
    use crate::{Caller, Event, Fields, Value};
    use std::sync::Arc;

    fn test_event() -> Event {
        let mut session = Fields::new();
        session.insert("foo".to_string(), Value::from("bar"));
        session.insert("bar".to_string(), Value::from("foo"));
        Event::with_session(
            Caller::new("my::module", "src/my/module.rs", 7, "handle"),
            Arc::new(session),
        )
        .with_field("true", true)
        .with_field("false", false)
    }

    fn globals() -> Fields {
        let mut globals = Fields::new();
        globals.insert("zero".to_string(), Value::from(0));
        globals.insert("one".to_string(), Value::from(1));
        globals
    }

    fn render(formatter: &PlainTextFormatter, event: &Event) -> String {
        let mut out = Vec::new();
        formatter.format_with(event, &globals(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_listings_are_only_computed_when_referenced() {
        let formatter = PlainTextFormatter::new("%(message|s)").unwrap();
        assert!(formatter.listings.is_empty());

        let formatter =
            PlainTextFormatter::new("%(.session_fields_comma_separated_text|s)").unwrap();
        assert!(formatter.needs(".session_fields_comma_separated_text"));
        assert!(!formatter.needs(".session_fields_space_separated_text"));
        assert!(!formatter.needs(".all_fields_comma_separated_text"));
    }

    #[test]
    fn test_sorted_listings() {
        let formatter = PlainTextFormatter::builder(
            [
                "%(.event_fields_space_separated_text|s)",
                "%(.event_fields_comma_separated_text|s)",
                "%(.session_fields_space_separated_text|s)",
                "%(.session_fields_comma_separated_text|s)",
                "%(.global_fields_space_separated_text|s)",
                "%(.global_fields_comma_separated_text|s)",
                "%(.all_fields_space_separated_text|s)",
                "%(.all_fields_comma_separated_text|s)",
            ]
            .join("\n"),
        )
        .sort_fields(true)
        .try_build()
        .unwrap();
        let lines = render(&formatter, &test_event());
        let lines: Vec<&str> = lines.lines().collect();
        assert_eq!(
            lines,
            vec![
                "false=false true=true",
                "false=false,true=true",
                "bar=\"foo\" foo=\"bar\"",
                "bar=\"foo\",foo=\"bar\"",
                "one=1 zero=0",
                "one=1,zero=0",
                "one=1 zero=0 bar=\"foo\" foo=\"bar\" false=false true=true",
                "one=1,zero=0,bar=\"foo\",foo=\"bar\",false=false,true=true",
            ]
        );
    }

    #[test]
    fn test_caller_fields() {
        let formatter = PlainTextFormatter::new(
            "%(caller.module|s)/%(caller.file|s):%(caller.func|s):%(caller.line|d)",
        )
        .unwrap();
        assert_eq!(render(&formatter, &test_event()), "my::module/module.rs:handle:7");
    }

    #[test]
    fn test_format_events() {
        use super::MultiEventFormatter;
        let formatter = PlainTextFormatter::new("%(caller.func|s) %(sample|d)").unwrap();
        let events = vec![
            test_event().with_field("sample", 1),
            test_event().with_field("sample", 2),
        ];
        let content = formatter.format_events(&events).unwrap();
        assert_eq!(String::from_utf8(content).unwrap(), "handle 1\nhandle 2\n");
    }

    #[test]
    fn test_invalid_timestamp_format() {
        assert!(PlainTextFormatter::builder("%(timestamp|s)")
            .timestamp_format("%Q")
            .try_build()
            .is_err());
    }

    #[cfg(feature = "colors")]
    #[test]
    fn test_level_color() {
        let formatter = PlainTextFormatter::builder("%(level|s)")
            .level_color("info", nu_ansi_term::Color::LightBlue)
            .try_build()
            .unwrap();
        let router = crate::Router::new();
        let writer = crate::writers::BufferWriter::new();
        router.add_handler(
            &["info", "warn"],
            Arc::new(crate::handlers::PlainTextHandler::new(
                formatter,
                writer.clone(),
            )),
        );
        test_event().log_to(&router, "info", "colored");
        test_event().log_to(&router, "warn", "plain");
        assert_eq!(
            writer.lines(),
            vec![
                nu_ansi_term::Color::LightBlue.paint("info").to_string(),
                "warn".to_string()
            ]
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json() {
        use super::{EventFormatter, JsonFormatter};
        let formatter = JsonFormatter::default();
        let content = formatter
            .format_event(&test_event().with_field("n", 5))
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&content).unwrap();
        assert_eq!(json["n"], 5);
        assert_eq!(json["foo"], "bar");
        assert_eq!(json["caller"]["func"], "handle");
        assert_eq!(json["caller"]["line"], 7);

        let opaque = test_event().with_field("chan", Value::opaque(std::time::Instant::now()));
        assert!(matches!(
            formatter.format_event(&opaque),
            Err(crate::RenderError::Json(_))
        ));
    }
}
