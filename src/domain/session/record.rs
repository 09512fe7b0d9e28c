//! Shared session record and the explicit per-request session context.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PrincipalId, SessionId, Timestamp, ValidationError};

/// A live client session as stored in the shared session store.
///
/// # Invariants
///
/// - at most one record per `principal_id` at any observation point; the
///   store has no uniqueness constraint, the session manager enforces it
/// - `last_active` is never before `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub principal_id: PrincipalId,
    pub principal_email: String,
    pub created_at: Timestamp,
    pub last_active: Timestamp,
}

impl SessionRecord {
    /// Creates a fresh record with a new globally-unique session id.
    pub fn new(
        principal_id: PrincipalId,
        principal_email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let principal_email = principal_email.into();
        if principal_email.trim().is_empty() {
            return Err(ValidationError::empty_field("principal_email"));
        }
        let now = Timestamp::now();
        Ok(Self {
            session_id: SessionId::new(),
            principal_id,
            principal_email,
            created_at: now,
            last_active: now,
        })
    }

    /// Returns a copy with `last_active` moved to `at` (never backwards).
    pub fn touched(&self, at: Timestamp) -> Self {
        let mut record = self.clone();
        if record.last_active.is_before(&at) {
            record.last_active = at;
        }
        record
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            session_id: self.session_id,
            principal_id: self.principal_id.clone(),
            principal_email: self.principal_email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Principal context threaded explicitly through request handlers.
///
/// Built once when the session is created; there is no ambient global
/// session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: SessionId,
    pub principal_id: PrincipalId,
    pub principal_email: String,
    pub created_at: Timestamp,
}

/// Why a session record disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// A newer sign-in for the same principal replaced it.
    Superseded,
    /// Explicit sign-out.
    SignedOut,
    /// Found missing when re-observing state (e.g. after a reconnect).
    Vanished,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Superseded => "superseded",
            RemovalReason::SignedOut => "signed_out",
            RemovalReason::Vanished => "vanished",
        }
    }

    /// Parses the wire form; unknown payloads are treated as `Vanished`.
    pub fn parse(s: &str) -> Self {
        match s {
            "superseded" => RemovalReason::Superseded,
            "signed_out" => RemovalReason::SignedOut,
            _ => RemovalReason::Vanished,
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn principal() -> PrincipalId {
        PrincipalId::new("jdoe").unwrap()
    }

    #[test]
    fn new_record_has_equal_created_and_last_active() {
        let record = SessionRecord::new(principal(), "jdoe@example.com").unwrap();
        assert_eq!(record.created_at, record.last_active);
    }

    #[test]
    fn new_records_get_distinct_ids() {
        let a = SessionRecord::new(principal(), "a@example.com").unwrap();
        let b = SessionRecord::new(principal(), "a@example.com").unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn blank_email_is_rejected() {
        assert!(SessionRecord::new(principal(), " ").is_err());
    }

    #[test]
    fn serializes_with_camel_case_store_fields() {
        let record = SessionRecord::new(principal(), "jdoe@example.com").unwrap();
        let value = serde_json::to_value(&record).unwrap();
        for field in ["sessionId", "principalId", "principalEmail", "createdAt", "lastActive"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(value["principalId"], json!("jdoe"));
    }

    #[test]
    fn touched_never_moves_backwards() {
        let record = SessionRecord::new(principal(), "jdoe@example.com").unwrap();
        let earlier = record.last_active.plus_secs(-60);
        let later = record.last_active.plus_secs(60);

        assert_eq!(record.touched(earlier).last_active, record.last_active);
        assert_eq!(record.touched(later).last_active, later);
    }

    #[test]
    fn context_carries_principal() {
        let record = SessionRecord::new(principal(), "jdoe@example.com").unwrap();
        let ctx = record.context();
        assert_eq!(ctx.session_id, record.session_id);
        assert_eq!(ctx.principal_id, record.principal_id);
    }

    #[test]
    fn removal_reason_round_trips_wire_form() {
        for reason in [RemovalReason::Superseded, RemovalReason::SignedOut] {
            assert_eq!(RemovalReason::parse(reason.as_str()), reason);
        }
        assert_eq!(RemovalReason::parse("garbage"), RemovalReason::Vanished);
    }
}
