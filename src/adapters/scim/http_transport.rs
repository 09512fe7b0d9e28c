//! reqwest-backed implementation of the `RemoteTransport` port.
//!
//! Adds `Authorization: Basic ...`, negotiates `application/scim+json`, and
//! bounds every call by the request's own timeout. Dropping the returned future
//! drops the in-flight reqwest request, which releases its connection.
//!
//! # Example
//!
//! ```ignore
//! let transport = ScimHttpTransport::new(ScimHttpConfig::default())?;
//! let response = transport
//!     .call(&credentials, TransportRequest::get("Me", Duration::from_secs(10)))
//!     .await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

use crate::ports::{
    Credentials, HttpMethod, RemoteTransport, TransportError, TransportRequest, TransportResponse,
};

/// SCIM media type used for request bodies.
pub const SCIM_MEDIA_TYPE: &str = "application/scim+json";

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ScimHttpConfig {
    /// Content type of request bodies.
    pub content_type: String,
    /// Accept header sent on every call.
    pub accept: String,
    /// Upper bound for establishing a TCP/TLS connection.
    pub connect_timeout: Duration,
}

impl Default for ScimHttpConfig {
    fn default() -> Self {
        Self {
            content_type: SCIM_MEDIA_TYPE.to_string(),
            accept: format!("{}, application/json", SCIM_MEDIA_TYPE),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ScimHttpConfig {
    /// Sets the media type used for both content type and accept.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        let media_type = media_type.into();
        self.accept = if media_type == "application/json" {
            media_type.clone()
        } else {
            format!("{}, application/json", media_type)
        };
        self.content_type = media_type;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// HTTP transport for the remote SCIM service.
#[derive(Debug, Clone)]
pub struct ScimHttpTransport {
    client: Client,
    config: ScimHttpConfig,
}

impl ScimHttpTransport {
    /// Creates a transport with its own connection pool.
    pub fn new(config: ScimHttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    async fn send(
        &self,
        credentials: &Credentials,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let url = request.url(credentials.base_url());

        let mut builder = self
            .client
            .request(Self::method(request.method), &url)
            .header(AUTHORIZATION, credentials.basic_authorization())
            .header(ACCEPT, &self.config.accept)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(ref body) = request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TransportError::network(format!("Failed to encode body: {}", e)))?;
            builder = builder
                .header(CONTENT_TYPE, &self.config.content_type)
                .body(bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(e, request.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(e, request.timeout))?;

        Ok(TransportResponse::new(status, body))
    }

    fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::timeout(timeout)
        } else if err.is_connect() {
            TransportError::network(format!("Connection failed: {}", err))
        } else {
            TransportError::network(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteTransport for ScimHttpTransport {
    async fn call(
        &self,
        credentials: &Credentials,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let started = Instant::now();

        // reqwest's own timeout covers the body read; the outer bound also
        // covers request construction and DNS.
        let result = match tokio::time::timeout(request.timeout, self.send(credentials, &request)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::timeout(request.timeout)),
        };

        match &result {
            Ok(response) => tracing::debug!(
                method = %request.method,
                path = %request.path,
                principal = %credentials.principal_id(),
                status = response.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "SCIM call completed"
            ),
            Err(e) => tracing::debug!(
                method = %request.method,
                path = %request.path,
                principal = %credentials.principal_id(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "SCIM call failed: {}",
                e
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_negotiates_scim_json() {
        let config = ScimHttpConfig::default();
        assert_eq!(config.content_type, "application/scim+json");
        assert!(config.accept.starts_with("application/scim+json"));
    }

    #[test]
    fn media_type_override_updates_both_headers() {
        let config = ScimHttpConfig::default().with_media_type("application/json");
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.accept, "application/json");
    }

    #[test]
    fn methods_map_to_reqwest() {
        assert_eq!(ScimHttpTransport::method(HttpMethod::Get), Method::GET);
        assert_eq!(ScimHttpTransport::method(HttpMethod::Post), Method::POST);
        assert_eq!(ScimHttpTransport::method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let transport = ScimHttpTransport::new(
            ScimHttpConfig::default().with_connect_timeout(Duration::from_millis(500)),
        )
        .unwrap();
        let credentials = Credentials::new(
            "http://127.0.0.1:1",
            crate::domain::foundation::PrincipalId::new("x").unwrap(),
            "y",
        )
        .unwrap();

        let result = transport
            .call(&credentials, TransportRequest::get("Me", Duration::from_secs(2)))
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
