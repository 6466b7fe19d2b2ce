//! Payment configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Which `PaymentGateway` implementation to wire.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    Stripe,
    /// In-process gateway that approves everything. Development only.
    Mock,
}

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub gateway: GatewayKind,

    /// Stripe secret API key
    pub stripe_api_key: Option<SecretString>,

    /// Override for the Stripe API base URL (stripe-mock, proxies)
    pub stripe_api_base_url: Option<String>,

    /// ISO 4217 currency for every charge
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Upper bound on a single gateway call, in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,
}

impl PaymentConfig {
    /// Get gateway timeout as Duration
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key
            .as_ref()
            .is_some_and(|k| k.expose_secret().starts_with("sk_test_"))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway == GatewayKind::Stripe {
            let key = self
                .stripe_api_key
                .as_ref()
                .map(|k| k.expose_secret().as_str())
                .unwrap_or_default();
            if key.is_empty() {
                return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
            }
            // Verify key prefix for safety
            if !key.starts_with("sk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.gateway_timeout_secs == 0 || self.gateway_timeout_secs > 60 {
            return Err(ValidationError::InvalidGatewayTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::default(),
            stripe_api_key: None,
            stripe_api_base_url: None,
            currency: default_currency(),
            gateway_timeout_secs: default_gateway_timeout(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_gateway_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripe(key: &str) -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: Some(SecretString::new(key.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = PaymentConfig::default();
        assert_eq!(config.gateway, GatewayKind::Stripe);
        assert_eq!(config.currency, "usd");
        assert_eq!(config.gateway_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_is_test_mode() {
        assert!(stripe("sk_test_xxx").is_test_mode());
        assert!(!stripe("sk_live_xxx").is_test_mode());
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = PaymentConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STRIPE_API_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        assert_eq!(
            stripe("pk_test_xxx").validate(),
            Err(ValidationError::InvalidStripeKey)
        );
    }

    #[test]
    fn test_mock_gateway_needs_no_key() {
        let config = PaymentConfig {
            gateway: GatewayKind::Mock,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_currency_and_timeout() {
        let config = PaymentConfig {
            currency: "dollars".to_string(),
            ..stripe("sk_test_xxx")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));

        let config = PaymentConfig {
            gateway_timeout_secs: 0,
            ..stripe("sk_test_xxx")
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidGatewayTimeout));
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(stripe("sk_test_abcd1234").validate().is_ok());
    }
}
