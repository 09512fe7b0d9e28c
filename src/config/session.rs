//! Session store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which session store backs the exclusivity manager
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Shared Redis store (multi-process)
    #[default]
    Redis,
    /// Process-local store (single process, tests)
    Memory,
}

/// Session store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Prefix for record and index keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Prefix for per-record change channels
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// Initial delay before re-subscribing after a dropped subscription
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Upper bound for the reconnect backoff
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay_ms: u64,
}

impl SessionConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn uses_redis(&self) -> bool {
        self.backend == SessionBackend::Redis
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_prefix.is_empty() {
            return Err(ValidationError::MissingRequired("SESSION__KEY_PREFIX"));
        }
        if self.channel_prefix.is_empty() {
            return Err(ValidationError::MissingRequired("SESSION__CHANNEL_PREFIX"));
        }
        if self.reconnect_delay_ms == 0 || self.max_reconnect_delay_ms < self.reconnect_delay_ms {
            return Err(ValidationError::InvalidTimeout("session.reconnect_delay_ms"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            key_prefix: default_key_prefix(),
            channel_prefix: default_channel_prefix(),
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_delay_ms: default_max_reconnect_delay(),
        }
    }
}

fn default_key_prefix() -> String {
    "scim-gateway:".to_string()
}

fn default_channel_prefix() -> String {
    "scim-gateway:session-events:".to_string()
}

fn default_reconnect_delay() -> u64 {
    500
}

fn default_max_reconnect_delay() -> u64 {
    30_000
}
