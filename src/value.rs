use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

/// Key/value fields of an event, a session, or the process.
pub type Fields = HashMap<String, Value>;

/// The value of a field.
///
/// `From` conversions exist for the usual scalar types, so that e.g.
/// `event.with_field("count", 7)` or `event.with_field("user", "alice")` just work.
#[derive(Clone)]
pub enum Value {
    /// A string; quoted in field listings.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A nested map of values.
    Map(BTreeMap<String, Value>),
    /// Anything else; rendered with its `Debug` representation, cannot be serialized.
    Opaque(Arc<dyn fmt::Debug + Send + Sync>),
}

impl Value {
    /// Wraps an arbitrary value that has no dedicated variant.
    pub fn opaque<T: fmt::Debug + Send + Sync + 'static>(t: T) -> Self {
        Self::Opaque(Arc::new(t))
    }

    /// Returns the string slice if this is a `Value::Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::Str(s) = self {
            Some(s)
        } else {
            None
        }
    }

    // "key=value", with string values being quoted
    pub(crate) fn write_pair(&self, key: &str, equal: &str, out: &mut String) {
        use std::fmt::Write;
        let _ = match self {
            Self::Str(s) => write!(out, "{key}{equal}{s:?}"),
            other => write!(out, "{key}{equal}{other}"),
        };
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    let mut pair = String::new();
                    value.write_pair(key, "=", &mut pair);
                    f.write_str(&pair)?;
                }
                f.write_str("}")
            }
            Self::Opaque(o) => write!(f, "{o:?}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Float(f64::from(x))
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}
impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Self::Int(i64::from(i))
                }
            }
        )*
    };
}
from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        i64::try_from(i).map_or_else(|_| Self::Str(i.to_string()), Self::Int)
    }
}
impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| Self::Str(i.to_string()), Self::Int)
    }
}

#[cfg(feature = "json")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Map(map) => serializer.collect_map(map),
            Self::Opaque(o) => Err(serde::ser::Error::custom(format!(
                "opaque value {o:?} cannot be serialized"
            ))),
        }
    }
}

// Joins the given fields to a listing like `a=1 b="x"`.
//
// The order of the entries follows the map iteration order, unless `sorted` is set;
// then the rendered `key=value` strings are ordered lexicographically.
pub(crate) fn join_fields(fields: &Fields, equal: &str, separator: &str, sorted: bool) -> String {
    let mut pairs: Vec<String> = fields
        .iter()
        .map(|(key, value)| {
            let mut pair = String::with_capacity(key.len() + 8);
            value.write_pair(key, equal, &mut pair);
            pair
        })
        .collect();
    if sorted {
        pairs.sort_unstable();
    }
    pairs.join(separator)
}
