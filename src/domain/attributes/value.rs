//! Attribute values as the remote service sends them, and their decoded forms.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One `{key, value}` pair from a remote response.
///
/// The value is kept exactly as received. The remote service does not commit
/// to a representation: the same attribute may arrive as a native JSON array in
/// one response and as a JSON-encoded string in the next. Use
/// [`AttributeEntry::decode`] to get a typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl AttributeEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Decodes the raw value into one of the known shapes.
    ///
    /// Strings that look like JSON containers (`[` or `{` after trimming) are
    /// parsed; a failed parse yields [`DecodedValue::Unparseable`] instead of
    /// falling back to the raw text.
    pub fn decode(&self) -> DecodedValue {
        match &self.value {
            Value::Null => DecodedValue::Empty,
            Value::Bool(b) => DecodedValue::Scalar(b.to_string()),
            Value::Number(n) => DecodedValue::Scalar(n.to_string()),
            Value::Array(items) => DecodedValue::Sequence(items.clone()),
            Value::Object(map) => DecodedValue::Mapping(map.clone()),
            Value::String(text) => decode_text(text),
        }
    }
}

fn decode_text(text: &str) -> DecodedValue {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return DecodedValue::Scalar(text.to_string());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => DecodedValue::Sequence(items),
        Ok(Value::Object(map)) => DecodedValue::Mapping(map),
        Ok(_) => DecodedValue::Scalar(text.to_string()),
        Err(e) => DecodedValue::Unparseable {
            raw: text.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Typed view of an attribute value after the explicit decode step.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// JSON null.
    Empty,
    /// A plain string, number or boolean, rendered as text.
    Scalar(String),
    /// A native array, or a string that parsed to one.
    Sequence(Vec<Value>),
    /// A native object, or a string that parsed to one.
    Mapping(Map<String, Value>),
    /// A string that looked structured but did not parse.
    Unparseable { raw: String, reason: String },
}

impl DecodedValue {
    /// Short shape name for warnings and logs.
    pub fn shape(&self) -> &'static str {
        match self {
            DecodedValue::Empty => "empty",
            DecodedValue::Scalar(_) => "scalar",
            DecodedValue::Sequence(_) => "sequence",
            DecodedValue::Mapping(_) => "mapping",
            DecodedValue::Unparseable { .. } => "unparseable",
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            DecodedValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

/// Non-fatal problem found while decoding remote data.
///
/// Attached to results rather than raised, so callers can proceed with empty
/// data while still telling "parse failed" apart from "legitimately empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    pub key: String,
    pub reason: String,
}

impl DecodeWarning {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute '{}': {}", self.key, self.reason)
    }
}

/// A decoded value together with any warnings produced along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome<T> {
    pub value: T,
    pub warnings: Vec<DecodeWarning>,
}

impl<T> DecodeOutcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(value: T, warning: DecodeWarning) -> Self {
        Self {
            value,
            warnings: vec![warning],
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
