use crate::{FieldLogError, Fields, RenderError, Value};
use regex::Regex;
use std::{io::Write, sync::OnceLock};

/// A compiled event template.
///
/// A template is a text with placeholders of the form `%(name|hint)`, where `name` is the key
/// of a field and `hint` determines how the field value is rendered:
///
/// | hint | rendering |
/// |------|-----------|
/// | `s`  | strings as they are, other values in their default textual form |
/// | `d`  | integers in decimal form; other values are a render error |
/// | `v`  | the default textual form of any value |
///
/// `%%` produces a single `%`. Placeholders for fields that don't exist render as nothing.
///
/// ```rust
/// let template = fieldlog::Template::compile("%(level|s) [%(timestamp|s)] %(message|s)").unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder { name: String, hint: Hint },
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Hint {
    Str,
    Decimal,
    Generic,
}
impl Hint {
    fn as_char(self) -> char {
        match self {
            Self::Str => 's',
            Self::Decimal => 'd',
            Self::Generic => 'v',
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"%%|%\(([^|()]*)\|([^)]*)\)").unwrap(/* pattern is valid */))
}

impl Template {
    /// Compiles the template.
    ///
    /// # Errors
    ///
    /// `FieldLogError::Template` if a placeholder has an empty name or an unknown hint.
    pub fn compile<S: Into<String>>(source: S) -> Result<Self, FieldLogError> {
        let source = source.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last_end = 0;
        for captures in placeholder_regex().captures_iter(&source) {
            let whole = captures.get(0).unwrap(/* group 0 always exists */);
            literal.push_str(&source[last_end..whole.start()]);
            last_end = whole.end();
            let (Some(name), Some(hint)) = (captures.get(1), captures.get(2)) else {
                // "%%"
                literal.push('%');
                continue;
            };
            if name.as_str().is_empty() {
                return Err(FieldLogError::Template(format!(
                    "placeholder without name at offset {}",
                    whole.start()
                )));
            }
            let hint = match hint.as_str() {
                "s" => Hint::Str,
                "d" => Hint::Decimal,
                "v" => Hint::Generic,
                other => {
                    return Err(FieldLogError::Template(format!(
                        "unknown format hint {other:?} for placeholder {:?}",
                        name.as_str()
                    )));
                }
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder {
                name: name.as_str().to_string(),
                hint,
            });
        }
        literal.push_str(&source[last_end..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { source, segments })
    }

    /// The template text as it was given.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the fields into the given buffer.
    ///
    /// # Errors
    ///
    /// `RenderError::HintMismatch` if a placeholder with hint `d` refers to a non-integer value.
    pub fn render_into(&self, fields: &Fields, out: &mut Vec<u8>) -> Result<(), RenderError> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.extend_from_slice(s.as_bytes()),
                Segment::Placeholder { name, hint } => match (fields.get(name), hint) {
                    (None, _) => {}
                    (Some(Value::Int(i)), Hint::Decimal) => {
                        write!(out, "{i}").ok();
                    }
                    (Some(_), Hint::Decimal) => {
                        return Err(RenderError::HintMismatch {
                            name: name.clone(),
                            hint: hint.as_char(),
                        });
                    }
                    (Some(value), Hint::Str | Hint::Generic) => {
                        write!(out, "{value}").ok();
                    }
                },
            }
        }
        Ok(())
    }

    /// Renders the fields into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`Template::render_into`].
    pub fn render(&self, fields: &Fields) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::with_capacity(self.source.len() + 64);
        self.render_into(fields, &mut out)?;
        Ok(out)
    }
}
