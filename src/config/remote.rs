//! Remote SCIM service configuration

use serde::Deserialize;
use std::time::Duration;

use super::environment::Environment;
use super::error::ValidationError;

/// Remote identity-governance service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// SCIM base URL, e.g. `https://iam.example.com/identityiq/scim/v2`
    pub base_url: String,

    /// Media type for request bodies and content negotiation
    #[serde(default = "default_media_type")]
    pub media_type: String,

    /// Workflow launch endpoint, relative to the base URL
    #[serde(default = "default_invoke_path")]
    pub invoke_path: String,

    /// Self-profile endpoint
    #[serde(default = "default_self_path")]
    pub self_path: String,

    /// User search endpoint
    #[serde(default = "default_users_path")]
    pub users_path: String,

    /// Attribute the principal id is matched against when searching
    #[serde(default = "default_identifier_attribute")]
    pub identifier_attribute: String,

    /// Schema URN placed in the invocation envelope
    #[serde(default = "default_invocation_schema")]
    pub invocation_schema: String,

    /// Timeout for workflow invocations in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout per profile resolution strategy in seconds
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate remote configuration
    ///
    /// In production, requires HTTPS for the base URL.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("REMOTE__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidRemoteUrl);
        }
        if environment.is_production() && !self.base_url.starts_with("https://") {
            return Err(ValidationError::RemoteMustBeHttps);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout("remote.request_timeout_secs"));
        }
        if self.resolve_timeout_secs == 0 || self.resolve_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("remote.resolve_timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("remote.connect_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            media_type: default_media_type(),
            invoke_path: default_invoke_path(),
            self_path: default_self_path(),
            users_path: default_users_path(),
            identifier_attribute: default_identifier_attribute(),
            invocation_schema: default_invocation_schema(),
            request_timeout_secs: default_request_timeout(),
            resolve_timeout_secs: default_resolve_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_media_type() -> String {
    "application/scim+json".to_string()
}

fn default_invoke_path() -> String {
    "LaunchedWorkflows".to_string()
}

fn default_self_path() -> String {
    "Me".to_string()
}

fn default_users_path() -> String {
    "Users".to_string()
}

fn default_identifier_attribute() -> String {
    "userName".to_string()
}

fn default_invocation_schema() -> String {
    crate::domain::invocation::DEFAULT_INVOCATION_SCHEMA.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_resolve_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}
