//! Resolved identity profile.

use serde_json::Value;

/// Profile payload returned by whichever resolution strategy won.
///
/// Treated as opaque by the gateway; the accessors only read the handful of
/// standard SCIM user fields needed to open a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProfile {
    payload: Value,
    source: String,
}

impl ResolvedProfile {
    pub fn new(payload: Value, source: impl Into<String>) -> Self {
        Self {
            payload,
            source: source.into(),
        }
    }

    /// Name of the strategy that produced this profile.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    pub fn id(&self) -> Option<&str> {
        self.payload.get("id").and_then(Value::as_str)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.payload.get("userName").and_then(Value::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.payload.get("displayName").and_then(Value::as_str)
    }

    /// Primary email, falling back to the first listed email.
    pub fn primary_email(&self) -> Option<&str> {
        let emails = self.payload.get("emails")?.as_array()?;
        emails
            .iter()
            .find(|e| e.get("primary").and_then(Value::as_bool) == Some(true))
            .or_else(|| emails.first())
            .and_then(|e| e.get("value"))
            .and_then(Value::as_str)
    }
}
