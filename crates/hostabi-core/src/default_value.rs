//! Default-value literals.
//!
//! A [`DefaultValue`] is the host-side literal a binding author attaches to a
//! type with the `default` modifier. It mirrors the host value categories the
//! validator dispatches on: strings, booleans, plain (floating point) numbers,
//! arbitrary-precision integers and objects.

use std::fmt;

/// A host literal used as a default value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// The host `undefined` value.
    Undefined,
    Boolean(bool),
    /// A plain host number. Only integral values below the safe-integer
    /// boundary are accepted for integer kinds.
    Number(f64),
    /// An arbitrary-precision integer literal.
    BigInt(i128),
    String(String),
    /// An object literal with keys in written order.
    Object(Vec<(String, DefaultValue)>),
}

impl DefaultValue {
    /// Build an object literal from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DefaultValue)>,
    {
        DefaultValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an arbitrary-precision integer literal.
    pub fn bigint(value: impl Into<i128>) -> Self {
        DefaultValue::BigInt(value.into())
    }

    /// The host type name, used in error messages.
    pub fn host_type(&self) -> &'static str {
        match self {
            DefaultValue::Undefined => "undefined",
            DefaultValue::Boolean(_) => "boolean",
            DefaultValue::Number(_) => "number",
            DefaultValue::BigInt(_) => "bigint",
            DefaultValue::String(_) => "string",
            DefaultValue::Object(_) => "object",
        }
    }

    /// Look up a key of an object literal.
    ///
    /// Returns `None` for missing keys and for non-object values.
    pub fn get(&self, key: &str) -> Option<&DefaultValue> {
        match self {
            DefaultValue::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Boolean(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Number(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::String(value)
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Undefined => write!(f, "undefined"),
            DefaultValue::Boolean(b) => write!(f, "{b}"),
            DefaultValue::Number(n) => write!(f, "{n}"),
            DefaultValue::BigInt(n) => write!(f, "{n}n"),
            DefaultValue::String(s) => write!(f, "{s:?}"),
            DefaultValue::Object(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {key}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
