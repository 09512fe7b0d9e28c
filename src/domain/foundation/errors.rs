//! Error types shared across the gateway.
//!
//! Component errors (`TransportError`, `InvocationError`, `ResolveError`,
//! `SessionError`) stay precise inside their components. At the edge they all
//! convert into [`GatewayError`], which carries one [`ErrorKind`], a
//! human-readable message and, where the remote service supplied one, the raw
//! diagnostic payload.

use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// The single typed kind every gateway failure resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Transport
    Timeout,
    Network,

    // Remote service
    RemoteRejected,
    MalformedResponse,

    // Identity
    PermissionDenied,
    InvalidCredentials,
    NotFound,
    AllStrategiesFailed,

    // Session
    SessionStoreUnavailable,
    InvalidSessionState,

    // Input
    ValidationFailed,
}

impl ErrorKind {
    /// Returns true if the caller may reasonably retry the same call.
    ///
    /// Nothing inside the gateway retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::SessionStoreUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::RemoteRejected => "REMOTE_ERROR",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AllStrategiesFailed => "ALL_STRATEGIES_FAILED",
            ErrorKind::SessionStoreUnavailable => "SESSION_STORE_UNAVAILABLE",
            ErrorKind::InvalidSessionState => "INVALID_SESSION_STATE",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
        };
        write!(f, "{}", s)
    }
}

/// User-facing gateway error: kind, message and optional raw remote payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub payload: Option<String>,
}

impl GatewayError {
    /// Creates a new gateway error without a payload.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            payload: None,
        }
    }

    /// Attaches the raw diagnostic payload returned by the remote service.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl Error for GatewayError {}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::new(ErrorKind::ValidationFailed, err.to_string())
    }
}
