//! Logging setup for the binary.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Environment variable holding the log filter directives.
pub const LOG_ENV_VAR: &str = "SNAPWARDEN_LOG";

/// Directives used when [`LOG_ENV_VAR`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// A global subscriber was already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Builds the filter from [`LOG_ENV_VAR`], falling back to
/// [`DEFAULT_LOG_FILTER`] when the variable is absent.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the variable holds invalid
/// directives.
pub fn env_filter() -> Result<EnvFilter, TelemetryError> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(directives).map_err(|err| TelemetryError::Filter(err.to_string()))
        }
        _ => EnvFilter::try_new(DEFAULT_LOG_FILTER)
            .map_err(|err| TelemetryError::Filter(err.to_string())),
    }
}

/// Installs a global subscriber writing to stderr in `format`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init(format: LogFormat) -> Result<(), TelemetryError> {
    let filter = env_filter()?;
    let (text, json) = match format {
        LogFormat::Text => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
