//! Ordered attribute bag decoded from remote responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::value::{AttributeEntry, DecodeOutcome, DecodeWarning, DecodedValue};

/// Top-level field holding the `{key, value}` sequence in remote responses.
pub const ATTRIBUTES_FIELD: &str = "attributes";

/// Ordered sequence of attribute entries.
///
/// Keys are not guaranteed unique; lookups return the first match. Bags are
/// small (tens of entries), so lookup is a linear scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBag {
    entries: Vec<AttributeEntry>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the `attributes` sequence of a parsed response body.
    ///
    /// A missing `attributes` field yields an empty bag. Entries that are not
    /// `{key, value}` objects are skipped with a warning rather than failing
    /// the whole response.
    pub fn from_response(body: &Value) -> DecodeOutcome<AttributeBag> {
        let raw = match body.get(ATTRIBUTES_FIELD) {
            None | Some(Value::Null) => return DecodeOutcome::clean(AttributeBag::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return DecodeOutcome::with_warning(
                    AttributeBag::new(),
                    DecodeWarning::new(
                        ATTRIBUTES_FIELD,
                        format!("expected a sequence, found {}", json_type(other)),
                    ),
                )
            }
        };

        let mut bag = AttributeBag::new();
        let mut warnings = Vec::new();
        for (index, item) in raw.iter().enumerate() {
            match serde_json::from_value::<AttributeEntry>(item.clone()) {
                Ok(entry) => bag.push(entry),
                Err(e) => warnings.push(DecodeWarning::new(
                    format!("{}[{}]", ATTRIBUTES_FIELD, index),
                    format!("skipped malformed entry: {}", e),
                )),
            }
        }

        DecodeOutcome {
            value: bag,
            warnings,
        }
    }

    pub fn push(&mut self, entry: AttributeEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.iter()
    }

    /// Returns the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&AttributeEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Returns the raw value of the first entry with the given key.
    pub fn extract(&self, key: &str) -> Option<&Value> {
        self.get(key).map(|e| &e.value)
    }

    /// Returns the decoded value of the first entry with the given key.
    pub fn decode(&self, key: &str) -> Option<DecodedValue> {
        self.get(key).map(AttributeEntry::decode)
    }

    /// Returns the attribute as text if it decodes to a scalar.
    pub fn extract_string(&self, key: &str) -> Option<String> {
        match self.decode(key)? {
            DecodedValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts a list attribute whether it arrived natively or JSON-encoded.
    ///
    /// - native sequence: returned as-is
    /// - string: parsed, and the parsed sequence returned
    /// - absent, null or blank string: empty, no warning
    /// - anything else (bad JSON, wrong shape, wrong element type): empty
    ///   plus a warning
    pub fn extract_list_or_json<T: DeserializeOwned>(&self, key: &str) -> DecodeOutcome<Vec<T>> {
        let decoded = match self.decode(key) {
            None | Some(DecodedValue::Empty) => return DecodeOutcome::clean(Vec::new()),
            Some(decoded) => decoded,
        };

        match decoded {
            DecodedValue::Sequence(items) => {
                match serde_json::from_value::<Vec<T>>(Value::Array(items)) {
                    Ok(list) => DecodeOutcome::clean(list),
                    Err(e) => DecodeOutcome::with_warning(
                        Vec::new(),
                        DecodeWarning::new(key, format!("unexpected element type: {}", e)),
                    ),
                }
            }
            DecodedValue::Scalar(text) if text.trim().is_empty() => {
                DecodeOutcome::clean(Vec::new())
            }
            DecodedValue::Scalar(_) => DecodeOutcome::with_warning(
                Vec::new(),
                DecodeWarning::new(key, "expected a list, found a scalar"),
            ),
            DecodedValue::Mapping(_) => DecodeOutcome::with_warning(
                Vec::new(),
                DecodeWarning::new(key, "expected a list, found a mapping"),
            ),
            DecodedValue::Unparseable { reason, .. } => DecodeOutcome::with_warning(
                Vec::new(),
                DecodeWarning::new(key, format!("unparseable list: {}", reason)),
            ),
            DecodedValue::Empty => DecodeOutcome::clean(Vec::new()),
        }
    }
}

impl FromIterator<AttributeEntry> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = AttributeEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AttributeBag {
    type Item = AttributeEntry;
    type IntoIter = std::vec::IntoIter<AttributeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(body: Value) -> AttributeBag {
        let outcome = AttributeBag::from_response(&body);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        outcome.value
    }

    #[test]
    fn decodes_attributes_in_order() {
        let bag = bag(json!({
            "attributes": [
                {"key": "a", "value": "x"},
                {"key": "b", "value": "y"}
            ]
        }));
        let keys: Vec<_> = bag.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn first_matching_key_wins() {
        let bag = bag(json!({
            "attributes": [
                {"key": "a", "value": "first"},
                {"key": "a", "value": "second"}
            ]
        }));
        assert_eq!(bag.extract("a"), Some(&json!("first")));
    }

    #[test]
    fn missing_attributes_field_is_empty_bag() {
        let bag = bag(json!({"id": "123"}));
        assert!(bag.is_empty());
    }

    #[test]
    fn non_array_attributes_field_warns() {
        let outcome = AttributeBag::from_response(&json!({"attributes": "oops"}));
        assert!(outcome.value.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].key, "attributes");
    }

    #[test]
    fn malformed_entries_are_skipped_with_warning() {
        let outcome = AttributeBag::from_response(&json!({
            "attributes": [
                {"key": "ok", "value": 1},
                {"value": "no key"},
                "not an object"
            ]
        }));
        assert_eq!(outcome.value.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.warnings[0].key, "attributes[1]");
    }

    #[test]
    fn extract_absent_key_is_none() {
        let bag = AttributeBag::new();
        assert!(bag.extract("missing").is_none());
    }

    #[test]
    fn extract_list_returns_native_sequence_unchanged() {
        let bag = bag(json!({"attributes": [{"key": "roles", "value": ["p", "q"]}]}));
        let outcome = bag.extract_list_or_json::<String>("roles");
        assert_eq!(outcome.value, vec!["p".to_string(), "q".to_string()]);
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn extract_list_parses_encoded_sequence() {
        let bag = bag(json!({"attributes": [{"key": "b", "value": "[1,2]"}]}));
        let outcome = bag.extract_list_or_json::<i64>("b");
        assert_eq!(outcome.value, vec![1, 2]);
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn extract_list_absent_is_empty_without_warning() {
        let outcome = AttributeBag::new().extract_list_or_json::<String>("nothing");
        assert!(outcome.value.is_empty());
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn extract_list_blank_string_is_empty_without_warning() {
        let bag = bag(json!({"attributes": [{"key": "b", "value": ""}]}));
        let outcome = bag.extract_list_or_json::<String>("b");
        assert!(outcome.value.is_empty());
        assert!(!outcome.has_warnings());
    }

    #[test]
    fn extract_list_parse_failure_is_distinguishable_from_empty() {
        let bag = bag(json!({"attributes": [
            {"key": "broken", "value": "[1,2"},
            {"key": "empty", "value": "[]"}
        ]}));

        let broken = bag.extract_list_or_json::<i64>("broken");
        let empty = bag.extract_list_or_json::<i64>("empty");

        assert!(broken.value.is_empty());
        assert!(broken.has_warnings());
        assert!(empty.value.is_empty());
        assert!(!empty.has_warnings());
    }

    #[test]
    fn extract_list_wrong_element_type_warns() {
        let bag = bag(json!({"attributes": [{"key": "b", "value": ["x", "y"]}]}));
        let outcome = bag.extract_list_or_json::<i64>("b");
        assert!(outcome.value.is_empty());
        assert!(outcome.has_warnings());
    }

    #[test]
    fn extract_list_from_mapping_warns() {
        let bag = bag(json!({"attributes": [{"key": "m", "value": {"a": 1}}]}));
        let outcome = bag.extract_list_or_json::<i64>("m");
        assert!(outcome.value.is_empty());
        assert_eq!(outcome.warnings[0].reason, "expected a list, found a mapping");
    }

    #[test]
    fn extract_string_only_returns_scalars() {
        let bag = bag(json!({"attributes": [
            {"key": "name", "value": "Alice"},
            {"key": "count", "value": 3},
            {"key": "list", "value": ["a"]}
        ]}));
        assert_eq!(bag.extract_string("name").as_deref(), Some("Alice"));
        assert_eq!(bag.extract_string("count").as_deref(), Some("3"));
        assert!(bag.extract_string("list").is_none());
    }
}
