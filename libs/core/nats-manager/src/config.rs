//! Manager configuration loaded from the environment.

use crate::api::{DEFAULT_API_PREFIX, domain_prefix, normalize_prefix};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default wait for a single API call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("'{0}' and '{1}' can not both be set")]
    Conflict(&'static str, &'static str),
}

/// Connection and API settings for a [`JetStreamManager`](crate::JetStreamManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// NATS server URL
    pub nats_url: String,

    /// Custom API prefix, e.g. one imported from another account
    pub api_prefix: Option<String>,

    /// JetStream domain
    pub domain: Option<String>,

    /// Default deadline of calls that set neither a timeout nor a token
    pub request_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_NATS_URL.to_string(),
            api_prefix: None,
            domain: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ManagerConfig {
    /// Load from the environment.
    ///
    /// - `NATS_URL` (default `nats://127.0.0.1:4222`)
    /// - `JS_API_PREFIX`
    /// - `JS_DOMAIN`
    /// - `JS_REQUEST_TIMEOUT_MS` (default 5000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            nats_url: env_or_default("NATS_URL", DEFAULT_NATS_URL),
            api_prefix: env_optional("JS_API_PREFIX"),
            domain: env_optional("JS_DOMAIN"),
            request_timeout: match env_optional("JS_REQUEST_TIMEOUT_MS") {
                Some(raw) => Duration::from_millis(raw.parse().map_err(|e| {
                    ConfigError::ParseError {
                        key: "JS_REQUEST_TIMEOUT_MS".to_string(),
                        details: format!("{e}"),
                    }
                })?),
                None => DEFAULT_REQUEST_TIMEOUT,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_nats_url(mut self, url: impl Into<String>) -> Self {
        self.nats_url = url.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_prefix.is_some() && self.domain.is_some() {
            return Err(ConfigError::Conflict("JS_API_PREFIX", "JS_DOMAIN"));
        }
        Ok(())
    }

    /// API prefix the manager addresses.
    pub fn resolved_prefix(&self) -> String {
        match (&self.api_prefix, &self.domain) {
            (Some(prefix), _) => normalize_prefix(prefix),
            (None, Some(domain)) => domain_prefix(domain),
            (None, None) => DEFAULT_API_PREFIX.to_string(),
        }
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = [
        "NATS_URL",
        "JS_API_PREFIX",
        "JS_DOMAIN",
        "JS_REQUEST_TIMEOUT_MS",
    ];

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(KEYS, || {
            let config = ManagerConfig::from_env().unwrap();
            assert_eq!(config, ManagerConfig::default());
            assert_eq!(config.resolved_prefix(), "$JS.API.");
        });
    }

    #[test]
    fn test_domain_and_timeout() {
        temp_env::with_vars(
            [
                ("NATS_URL", Some("nats://nats:4222")),
                ("JS_API_PREFIX", None),
                ("JS_DOMAIN", Some("hub")),
                ("JS_REQUEST_TIMEOUT_MS", Some("250")),
            ],
            || {
                let config = ManagerConfig::from_env().unwrap();
                assert_eq!(config.nats_url, "nats://nats:4222");
                assert_eq!(config.request_timeout, Duration::from_millis(250));
                assert_eq!(config.resolved_prefix(), "$JS.hub.API.");
            },
        );
    }

    #[test]
    fn test_custom_prefix_normalized() {
        temp_env::with_vars(
            [("JS_API_PREFIX", Some("$JS.leaf.API")), ("JS_DOMAIN", None)],
            || {
                let config = ManagerConfig::from_env().unwrap();
                assert_eq!(config.resolved_prefix(), "$JS.leaf.API.");
            },
        );
    }

    #[test]
    fn test_invalid_timeout() {
        temp_env::with_var("JS_REQUEST_TIMEOUT_MS", Some("soon"), || {
            let err = ManagerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JS_REQUEST_TIMEOUT_MS"));
        });
    }

    #[test]
    fn test_prefix_and_domain_conflict() {
        temp_env::with_vars(
            [("JS_API_PREFIX", Some("$JS.x.API")), ("JS_DOMAIN", Some("hub"))],
            || {
                let err = ManagerConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Conflict(_, _)));
            },
        );
    }
}
