//! HTTP listener settings

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Deployment stage; production switches logs to JSON and tightens validation.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Settings for the membership API listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `host:port` the API binds, e.g. `127.0.0.1:3000`
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    #[serde(default)]
    pub environment: Environment,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ceiling on a whole HTTP request, gateway calls included
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Comma-separated browser origins; unset allows any origin
    #[serde(default)]
    pub cors_origins: Option<String>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Configured origins, blanks dropped.
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bind_address.port() == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.log_level.trim().is_empty() {
            return Err(ValidationError::MissingRequired("server.log_level"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            environment: Environment::default(),
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_origins: None,
        }
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

fn default_log_level() -> String {
    "info,membership_billing=debug,sqlx=warn".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listens_on_all_interfaces_by_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bind_address_parses_from_string() {
        let config: ServerConfig =
            serde_json::from_value(serde_json::json!({ "bind_address": "127.0.0.1:3000" }))
                .unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.bind_address.ip().is_loopback());
    }

    #[test]
    fn malformed_bind_address_is_rejected_at_load() {
        let result: Result<ServerConfig, _> =
            serde_json::from_value(serde_json::json!({ "bind_address": "not a host" }));
        assert!(result.is_err());
    }

    #[test]
    fn port_zero_is_invalid() {
        let config = ServerConfig {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn request_timeout_must_be_bounded() {
        for secs in [0, MAX_REQUEST_TIMEOUT_SECS + 1] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
        }
    }

    #[test]
    fn blank_origins_are_dropped() {
        let config = ServerConfig {
            cors_origins: Some("https://app.example.com, ,https://admin.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.allowed_origins(),
            vec!["https://app.example.com", "https://admin.example.com"]
        );
        assert!(ServerConfig::default().allowed_origins().is_empty());
    }

    #[test]
    fn production_is_detected() {
        let config = ServerConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(config.is_production());
    }
}
