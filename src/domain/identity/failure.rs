//! Classification of concurrent resolution failures.
//!
//! Resolution strategies run concurrently and fail in whatever order the
//! network dictates. When every strategy fails, [`classify`] reduces the set
//! to one [`ResolveError`] using a fixed precedence:
//!
//! ```text
//! PermissionDenied > InvalidCredentials > NotFound (only if all NotFound) > AllStrategiesFailed
//! ```
//!
//! The result depends only on the set of failures, never on completion order.

use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{ErrorKind, GatewayError};

/// What went wrong in a single strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    PermissionDenied,
    InvalidCredentials,
    NotFound,
    Timeout,
    Network,
    Remote { status: u16 },
    MalformedResponse,
}

impl FailureKind {
    /// Maps a non-2xx HTTP status onto a failure kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureKind::InvalidCredentials,
            403 => FailureKind::PermissionDenied,
            404 => FailureKind::NotFound,
            other => FailureKind::Remote { status: other },
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::PermissionDenied => write!(f, "permission denied"),
            FailureKind::InvalidCredentials => write!(f, "invalid credentials"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Remote { status } => write!(f, "remote error {}", status),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

/// One strategy's classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrategyFailure {
    pub strategy: String,
    pub kind: FailureKind,
    pub message: String,
}

impl StrategyFailure {
    pub fn new(strategy: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.strategy, self.kind, self.message)
    }
}

/// Aggregate failure of profile resolution.
///
/// Every variant keeps the full list of individual failures for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("permission denied: {message}")]
    PermissionDenied {
        message: String,
        failures: Vec<StrategyFailure>,
    },

    #[error("invalid credentials: {message}")]
    InvalidCredentials {
        message: String,
        failures: Vec<StrategyFailure>,
    },

    #[error("profile not found: {message}")]
    NotFound {
        message: String,
        failures: Vec<StrategyFailure>,
    },

    #[error("all resolution strategies failed: {}", summarize(.failures))]
    AllStrategiesFailed { failures: Vec<StrategyFailure> },
}

impl ResolveError {
    pub fn failures(&self) -> &[StrategyFailure] {
        match self {
            ResolveError::PermissionDenied { failures, .. }
            | ResolveError::InvalidCredentials { failures, .. }
            | ResolveError::NotFound { failures, .. }
            | ResolveError::AllStrategiesFailed { failures } => failures,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ResolveError::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            ResolveError::NotFound { .. } => ErrorKind::NotFound,
            ResolveError::AllStrategiesFailed { .. } => ErrorKind::AllStrategiesFailed,
        }
    }
}

impl From<ResolveError> for GatewayError {
    fn from(err: ResolveError) -> Self {
        let payload = summarize(err.failures());
        let gateway = GatewayError::new(err.kind(), err.to_string());
        if payload.is_empty() {
            gateway
        } else {
            gateway.with_payload(payload)
        }
    }
}

/// Reduces an unordered set of strategy failures to one error.
pub fn classify(failures: Vec<StrategyFailure>) -> ResolveError {
    let mut failures = failures;
    failures.sort_by(|a, b| {
        a.strategy
            .cmp(&b.strategy)
            .then_with(|| a.message.cmp(&b.message))
    });

    let first_of = |kind: &FailureKind| {
        failures
            .iter()
            .find(|f| &f.kind == kind)
            .map(|f| f.to_string())
    };

    if let Some(message) = first_of(&FailureKind::PermissionDenied) {
        return ResolveError::PermissionDenied { message, failures };
    }
    if let Some(message) = first_of(&FailureKind::InvalidCredentials) {
        return ResolveError::InvalidCredentials { message, failures };
    }
    if !failures.is_empty() && failures.iter().all(|f| f.kind == FailureKind::NotFound) {
        let message = failures[0].to_string();
        return ResolveError::NotFound { message, failures };
    }
    ResolveError::AllStrategiesFailed { failures }
}

fn summarize(failures: &[StrategyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
