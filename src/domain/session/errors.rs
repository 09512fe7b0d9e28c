//! Session-specific error types.

use crate::domain::foundation::{ErrorKind, GatewayError, ValidationError};

/// Session exclusivity errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The requested lifecycle transition is not allowed from the current phase.
    InvalidState(String),
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// The shared session store could not be reached or rejected the operation.
    Infrastructure(String),
}

impl SessionError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SessionError::InvalidState(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SessionError::Infrastructure(message.into())
    }
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidState(_) => ErrorKind::InvalidSessionState,
            SessionError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            SessionError::Infrastructure(_) => ErrorKind::SessionStoreUnavailable,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::InvalidState(msg) => format!("Invalid session state: {}", msg),
            SessionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::Infrastructure(msg) => format!("Session store error: {}", msg),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                SessionError::validation(field, "cannot be empty")
            }
            ValidationError::InvalidFormat { field, reason } => {
                if field == "state_transition" {
                    SessionError::invalid_state(reason)
                } else {
                    SessionError::validation(field, reason)
                }
            }
        }
    }
}

impl From<SessionError> for GatewayError {
    fn from(err: SessionError) -> Self {
        GatewayError::new(err.kind(), err.message())
    }
}
