//! Coordinator configuration.
//!
//! Defaults suit a single-ledger holder. Override via environment
//! variables or explicit construction for tests.

use std::time::Duration;

use crate::auto_respond::AutoAcceptCredential;
use crate::resolver::DEFAULT_CACHE_TTL;

/// Configuration of a [`crate::coordinator::CredentialFormatCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Auto-accept policy callers consult alongside the predicates.
    pub auto_accept: AutoAcceptCredential,
    /// Put a TTL cache in front of the resolver.
    pub resolver_cache: bool,
    /// Lifetime of cached resolver answers.
    pub resolver_cache_ttl: Duration,
    /// Link secret used when a caller names none.
    pub link_secret_id: Option<String>,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auto_accept: AutoAcceptCredential::Never,
            resolver_cache: true,
            resolver_cache_ttl: DEFAULT_CACHE_TTL,
            link_secret_id: None,
            log_json: false,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CREDEX_AUTO_ACCEPT` (default: `never`)
    /// - `CREDEX_RESOLVER_CACHE` (default: `true`)
    /// - `CREDEX_RESOLVER_CACHE_TTL_SECS` (default: 300)
    /// - `CREDEX_LINK_SECRET_ID` (default: the store's default secret)
    /// - `CREDEX_LOG_JSON` (default: `false`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, one call per variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let auto_accept = match lookup("CREDEX_AUTO_ACCEPT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "CREDEX_AUTO_ACCEPT".into(),
                value: raw.clone(),
                reason: "expected always, content-approved or never".into(),
            })?,
            None => defaults.auto_accept,
        };
        let resolver_cache_ttl = match lookup("CREDEX_RESOLVER_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|e| {
                ConfigError::InvalidValue {
                    var: "CREDEX_RESOLVER_CACHE_TTL_SECS".into(),
                    value: raw.clone(),
                    reason: format!("{e}"),
                }
            })?),
            None => defaults.resolver_cache_ttl,
        };
        Ok(Self {
            auto_accept,
            resolver_cache: env_bool(&lookup, "CREDEX_RESOLVER_CACHE", defaults.resolver_cache)?,
            resolver_cache_ttl,
            link_secret_id: lookup("CREDEX_LINK_SECRET_ID").filter(|id| !id.trim().is_empty()),
            log_json: env_bool(&lookup, "CREDEX_LOG_JSON", defaults.log_json)?,
        })
    }
}

fn env_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
            reason: "expected a boolean".into(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds an unusable value.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        /// Variable or setting name.
        var: String,
        /// Rejected value.
        value: String,
        /// What was expected.
        reason: String,
    },
}
