//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100 connections")]
    InvalidPoolSize,

    #[error("Invalid Stripe API key format")]
    InvalidStripeKey,

    #[error("Currency must be a three-letter ISO 4217 code")]
    InvalidCurrency,

    #[error("Gateway timeout must be between 1 and 60 seconds")]
    InvalidGatewayTimeout,

    #[error("The mock payment gateway is not allowed in production")]
    MockGatewayInProduction,

    #[error("Invalid billing policy: {0}")]
    InvalidBillingPolicy(&'static str),
}
