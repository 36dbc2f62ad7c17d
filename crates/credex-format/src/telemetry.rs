//! Tracing subscriber setup for binaries and tests embedding the
//! coordinator. `RUST_LOG` wins over the configured default filter.

use tracing_subscriber::EnvFilter;

use crate::config::CoordinatorConfig;

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// JSON lines instead of human-readable output.
    pub json: bool,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            default_filter: "info".to_string(),
        }
    }
}

impl From<&CoordinatorConfig> for TelemetryConfig {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            json: config.log_json,
            ..Self::default()
        }
    }
}

/// Subscriber installation failed.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The default filter does not parse.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// Rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber is already set.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

fn env_filter(default_filter: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Install the global tracing subscriber.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(&config.default_filter)?;
    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}
