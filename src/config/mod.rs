//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `MEMBERSHIP_BILLING`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use membership_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod billing;
mod database;
mod error;
mod payment;
mod server;

pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::{GatewayKind, PaymentConfig};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

use crate::application::LifecycleSettings;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listener address, environment and HTTP limits
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Payment configuration (Stripe)
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Lifecycle policy knobs
    #[serde(default)]
    pub billing: BillingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MEMBERSHIP_BILLING` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `MEMBERSHIP_BILLING__SERVER__BIND_ADDRESS=127.0.0.1:3000` -> `server.bind_address`
    /// - `MEMBERSHIP_BILLING__BILLING__SLOT_CAPACITY=30` -> `billing.slot_capacity = 30`
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MEMBERSHIP_BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Outside production an empty database URL selects the in-memory store,
    /// so the database section is only checked when a URL is present.
    /// Production also refuses the mock gateway.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if self.is_production() || self.database.uses_postgres() {
            self.database.validate()?;
        }
        if self.is_production() && self.payment.gateway == GatewayKind::Mock {
            return Err(ValidationError::MockGatewayInProduction);
        }
        self.payment.validate()?;
        self.billing.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Settings handed to the lifecycle manager.
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            policy: self.billing.policy(),
            currency: self.payment.currency.clone(),
            gateway_timeout: self.payment.gateway_timeout(),
        }
    }
}
