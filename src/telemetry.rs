//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig, ValidationError};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Returns `Ok(false)` if a global
/// subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, ValidationError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ValidationError::InvalidLogLevel(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    Ok(installed)
}
