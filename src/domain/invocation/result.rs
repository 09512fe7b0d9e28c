//! Decoded invocation results.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::attributes::{AttributeBag, DecodeOutcome, DecodeWarning};
use crate::domain::foundation::CaseId;

/// Top-level field carrying the remote case identifier.
pub const CASE_ID_FIELD: &str = "id";

/// Top-level field the remote uses to report how the workflow finished.
pub const COMPLETION_STATUS_FIELD: &str = "completionStatus";

/// Result of one invocation. Created per call and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub succeeded: bool,
    pub case_id: Option<CaseId>,
    pub attributes: AttributeBag,
    /// Non-fatal problems found while decoding the response.
    pub warnings: Vec<DecodeWarning>,
}

impl InvocationResult {
    /// Builds a result from a parsed 2xx response body.
    pub fn from_response(body: &Value) -> Self {
        let DecodeOutcome {
            value: attributes,
            warnings,
        } = AttributeBag::from_response(body);

        let case_id = body
            .get(CASE_ID_FIELD)
            .and_then(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(CaseId::new);

        let succeeded = !body
            .get(COMPLETION_STATUS_FIELD)
            .and_then(Value::as_str)
            .map(is_failed_status)
            .unwrap_or(false);

        Self {
            succeeded,
            case_id,
            attributes,
            warnings,
        }
    }

    /// Raw value of a named output.
    pub fn output(&self, key: &str) -> Option<&Value> {
        self.attributes.extract(key)
    }

    /// Named output as text, if it is a scalar.
    pub fn output_string(&self, key: &str) -> Option<String> {
        self.attributes.extract_string(key)
    }

    /// Named list output, tolerant of native and JSON-encoded lists.
    pub fn output_list<T: DeserializeOwned>(&self, key: &str) -> DecodeOutcome<Vec<T>> {
        self.attributes.extract_list_or_json(key)
    }
}

fn is_failed_status(status: &str) -> bool {
    matches!(
        status.to_ascii_lowercase().as_str(),
        "error" | "failure" | "failed"
    )
}
