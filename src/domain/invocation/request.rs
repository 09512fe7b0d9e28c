//! Invocation requests and parameter encoding.

use serde_json::{Map, Value};

use crate::domain::attributes::AttributeEntry;
use crate::domain::foundation::ValidationError;

/// Parameters for a remote operation.
///
/// The remote parameter channel is string-typed and ordered. A mapping is
/// flattened in insertion order; an explicit sequence is sent exactly as given,
/// which lets callers repeat keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    Mapping(Map<String, Value>),
    Ordered(Vec<AttributeEntry>),
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters::Mapping(Map::new())
    }
}

impl Parameters {
    /// Encodes the parameters into the `{key, value}` sequence sent on the wire.
    ///
    /// Mapping values that are arrays or objects are serialized to JSON text;
    /// strings, numbers, booleans and null pass through. Ordered sequences are
    /// not touched.
    pub fn encode(&self) -> Vec<AttributeEntry> {
        match self {
            Parameters::Mapping(map) => map
                .iter()
                .map(|(key, value)| AttributeEntry::new(key.clone(), encode_value(value)))
                .collect(),
            Parameters::Ordered(pairs) => pairs.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Parameters::Mapping(map) => map.len(),
            Parameters::Ordered(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Parameters::Mapping(map)
    }
}

impl From<Vec<AttributeEntry>> for Parameters {
    fn from(pairs: Vec<AttributeEntry>) -> Self {
        Parameters::Ordered(pairs)
    }
}

/// One remote operation call: operation name plus parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    operation_name: String,
    parameters: Parameters,
}

impl InvocationRequest {
    /// Creates a request with no parameters.
    pub fn new(operation_name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_parameters(operation_name, Parameters::default())
    }

    pub fn with_parameters(
        operation_name: impl Into<String>,
        parameters: impl Into<Parameters>,
    ) -> Result<Self, ValidationError> {
        let operation_name = operation_name.into();
        if operation_name.trim().is_empty() {
            return Err(ValidationError::empty_field("operation_name"));
        }
        Ok(Self {
            operation_name,
            parameters: parameters.into(),
        })
    }

    /// Adds one parameter.
    ///
    /// On a mapping this replaces an existing key; on an ordered sequence it
    /// appends.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self.parameters {
            Parameters::Mapping(map) => {
                map.insert(key.into(), value.into());
            }
            Parameters::Ordered(pairs) => pairs.push(AttributeEntry::new(key, value)),
        }
        self
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}
