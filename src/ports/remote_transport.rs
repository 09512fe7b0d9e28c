//! Remote transport port - authenticated calls to the SCIM service.
//!
//! Every call carries the caller's credentials and an explicit timeout. The
//! port never retries; retry policy belongs to callers.
//!
//! # Cancellation
//!
//! A call is cancelled by dropping its future. Implementations must release
//! the underlying connection when that happens, and must surface
//! `TransportError::Timeout` (not hang) when the timeout elapses.
//!
//! # Example
//!
//! ```ignore
//! let request = TransportRequest::get("Me", Duration::from_secs(10));
//! let response = transport.call(&credentials, request).await?;
//! if response.is_success() {
//!     let body: serde_json::Value = serde_json::from_str(&response.body)?;
//! }
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{ErrorKind, GatewayError, PrincipalId, ValidationError};

/// Per-call credentials for the remote service.
///
/// Owned by the calling client for the duration of a request; never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    base_url: String,
    principal_id: PrincipalId,
    secret: Secret<String>,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        principal_id: PrincipalId,
        secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ValidationError::invalid_format(
                "base_url",
                "must start with http:// or https://",
            ));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            principal_id,
            secret: Secret::new(secret.into()),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    /// `Basic base64(principalId:secret)`
    pub fn basic_authorization(&self) -> String {
        let raw = format!(
            "{}:{}",
            self.principal_id.as_str(),
            self.secret.expose_secret()
        );
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// HTTP method of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

/// One outbound call. The timeout is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Path relative to the credentials' base URL.
    pub path: String,
    /// Query parameters, URL-encoded by the adapter.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn get(path: impl Into<String>, timeout: Duration) -> Self {
        Self::new(HttpMethod::Get, path, timeout)
    }

    pub fn post(path: impl Into<String>, body: Value, timeout: Duration) -> Self {
        Self::new(HttpMethod::Post, path, timeout).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Joins the request path onto a base URL.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Raw response: status and body text, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure. Always retryable by caller policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Timeout { .. } => ErrorKind::Timeout,
            TransportError::Network(_) => ErrorKind::Network,
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        GatewayError::new(err.kind(), err.to_string())
    }
}

/// Port for authenticated calls to the remote SCIM service.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Performs one call bounded by `request.timeout`.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failures
    /// to obtain a response are `TransportError`s.
    async fn call(
        &self,
        credentials: &Credentials,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> Credentials {
        Credentials::new(
            "https://iam.example.com/scim/v2/",
            PrincipalId::new("spadmin").unwrap(),
            "admin",
        )
        .unwrap()
    }

    #[test]
    fn basic_authorization_encodes_principal_and_secret() {
        // base64("spadmin:admin")
        assert_eq!(
            credentials().basic_authorization(),
            "Basic c3BhZG1pbjphZG1pbg=="
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("\"admin\""));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn base_url_must_have_scheme() {
        let err = Credentials::new("iam.example.com", PrincipalId::new("x").unwrap(), "y");
        assert!(err.is_err());
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let creds = credentials();
        let request = TransportRequest::get("/Me", Duration::from_secs(1));
        assert_eq!(
            request.url(creds.base_url()),
            "https://iam.example.com/scim/v2/Me"
        );
    }

    #[test]
    fn post_builder_sets_body() {
        let request = TransportRequest::post("LaunchedWorkflows", json!({"a": 1}), Duration::from_secs(5))
            .with_query("attributes", "id");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body, Some(json!({"a": 1})));
        assert_eq!(request.query, vec![("attributes".to_string(), "id".to_string())]);
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(500, "boom").is_success());
    }

    #[test]
    fn transport_errors_map_to_retryable_kinds() {
        let err: GatewayError = TransportError::timeout(Duration::from_millis(250)).into();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.is_retryable());
        assert_eq!(err.message, "request timed out after 250ms");
    }

    #[test]
    fn remote_transport_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn RemoteTransport) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn RemoteTransport>>();
    }
}
