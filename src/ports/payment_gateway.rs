//! Payment gateway port for external money movement.
//!
//! Defines the contract the lifecycle engine uses to authorize charges,
//! issue refunds and query payment status. The gateway is remote, fallible
//! and latent; callers bound every call with a timeout.
//!
//! # Design
//!
//! - **Minor units**: amounts cross this boundary as integer cents
//! - **Reference keyed**: refunds and status queries use the authorization reference
//! - **Safe messages**: `PaymentError::message` may be shown to users

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::membership::MembershipError;

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request authorization of a charge.
    ///
    /// Returns the gateway reference and the client secret the payer uses
    /// to complete the payment.
    async fn authorize(&self, request: AuthorizationRequest)
        -> Result<Authorization, PaymentError>;

    /// Refund `amount_minor` against an earlier authorization.
    async fn refund(&self, reference: &str, amount_minor: i64) -> Result<Refund, PaymentError>;

    /// Current status of an authorization.
    async fn confirm_status(&self, reference: &str) -> Result<PaymentIntentStatus, PaymentError>;
}

/// Request to authorize a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO currency code, lowercase.
    pub currency: String,

    /// Key/value pairs stored with the charge (account, membership, purpose).
    pub metadata: BTreeMap<String, String>,
}

impl AuthorizationRequest {
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

/// Successful authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Gateway's reference for the charge.
    pub reference: String,

    /// Secret handed to the client to complete payment.
    pub client_secret: String,
}

/// Refund issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub refund_reference: String,
    pub status: RefundStatus,
}

/// Status of a refund as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Succeeded => "succeeded",
            RefundStatus::Failed => "failed",
            RefundStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "succeeded" => RefundStatus::Succeeded,
            "failed" => RefundStatus::Failed,
            "canceled" => RefundStatus::Canceled,
            _ => RefundStatus::Pending,
        }
    }
}

/// Status of an authorization as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Unknown,
}

impl PaymentIntentStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "requires_payment_method" => PaymentIntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => PaymentIntentStatus::RequiresConfirmation,
            "requires_action" => PaymentIntentStatus::RequiresAction,
            "processing" => PaymentIntentStatus::Processing,
            "succeeded" => PaymentIntentStatus::Succeeded,
            "canceled" => PaymentIntentStatus::Canceled,
            _ => PaymentIntentStatus::Unknown,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, PaymentIntentStatus::Succeeded)
    }
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message, safe to show.
    pub message: String,

    /// Provider's error code (if available). Logged, never shown.
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CardDeclined, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    /// The gateway did not answer within `secs` seconds.
    pub fn timeout(secs: u64) -> Self {
        Self::new(
            PaymentErrorCode::Timeout,
            format!("payment gateway did not respond within {}s", secs),
        )
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for MembershipError {
    fn from(err: PaymentError) -> Self {
        MembershipError::Payment {
            code: err.code.to_string(),
            message: err.message,
            retryable: err.retryable,
        }
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// Call exceeded the configured bound.
    Timeout,

    /// API authentication failed.
    AuthenticationError,

    /// Card was declined.
    CardDeclined,

    /// Insufficient funds.
    InsufficientFunds,

    /// Referenced charge or refund does not exist.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Request rejected as malformed.
    InvalidRequest,

    /// Provider API error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::Timeout
                | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::CardDeclined => "card_declined",
            PaymentErrorCode::InsufficientFunds => "insufficient_funds",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
