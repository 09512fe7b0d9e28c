//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SCIM_GATEWAY_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use scim_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Remote service at {}", config.remote.base_url);
//! ```

mod environment;
mod error;
mod logging;
mod redis;
mod remote;
mod session;

pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use redis::RedisConfig;
pub use remote::RemoteConfig;
pub use session::{SessionBackend, SessionConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Remote SCIM service (base URL, endpoints, timeouts)
    pub remote: RemoteConfig,

    /// Redis connection for the shared session store
    #[serde(default)]
    pub redis: RedisConfig,

    /// Session store keys, backend and reconnect policy
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level and output format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SCIM_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SCIM_GATEWAY__REMOTE__BASE_URL=...` -> `remote.base_url = ...`
    /// - `SCIM_GATEWAY__SESSION__BACKEND=memory` -> `session.backend = memory`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SCIM_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Redis settings are only checked when Redis backs the session store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.remote.validate(&self.environment)?;
        self.session.validate()?;
        if self.session.uses_redis() {
            self.redis.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SCIM_GATEWAY__REMOTE__BASE_URL",
        "SCIM_GATEWAY__REMOTE__RESOLVE_TIMEOUT_SECS",
        "SCIM_GATEWAY__REDIS__URL",
        "SCIM_GATEWAY__SESSION__BACKEND",
        "SCIM_GATEWAY__ENVIRONMENT",
        "SCIM_GATEWAY__LOGGING__FORMAT",
    ];

    /// Helper to set environment variables for testing
    fn set_minimal_env() {
        env::set_var("SCIM_GATEWAY__REMOTE__BASE_URL", "https://iam.example.com/scim/v2");
        env::set_var("SCIM_GATEWAY__REDIS__URL", "redis://localhost:6379");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.remote.base_url, "https://iam.example.com/scim/v2");
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.remote.invoke_path, "LaunchedWorkflows");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SCIM_GATEWAY__REMOTE__RESOLVE_TIMEOUT_SECS", "3");
        env::set_var("SCIM_GATEWAY__LOGGING__FORMAT", "json");
        env::set_var("SCIM_GATEWAY__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.remote.resolve_timeout_secs, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.is_production());
    }

    #[test]
    fn test_memory_backend_skips_redis_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SCIM_GATEWAY__REMOTE__BASE_URL", "http://localhost:9000/scim");
        env::set_var("SCIM_GATEWAY__SESSION__BACKEND", "memory");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_remote_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
