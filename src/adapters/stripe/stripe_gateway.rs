//! Stripe payment gateway adapter.
//!
//! Maps the `PaymentGateway` port onto Stripe's PaymentIntent API:
//! - `authorize` creates a PaymentIntent
//! - `refund` creates a Refund against a PaymentIntent
//! - `confirm_status` retrieves a PaymentIntent
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let gateway = StripePaymentGateway::new(config);
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::ports::{
    Authorization, AuthorizationRequest, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentIntentStatus, Refund, RefundStatus,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeRefund {
    id: String,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
    message: Option<String>,
}

/// Stripe payment gateway.
pub struct StripePaymentGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base_url, path)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = map_error(status, &body);
            tracing::error!(
                operation,
                http_status = status.as_u16(),
                code = %error.code,
                provider_code = error.provider_code.as_deref().unwrap_or("-"),
                "Stripe request failed"
            );
            return Err(error);
        }

        response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })
    }
}

/// Translates a Stripe error response into a `PaymentError`.
///
/// The provider's message goes to the debug log only;
/// the returned message is generic.
fn map_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();

    let code = match (status, detail.kind.as_deref()) {
        (_, Some("card_error")) => match detail.decline_code.as_deref() {
            Some("insufficient_funds") => PaymentErrorCode::InsufficientFunds,
            _ => PaymentErrorCode::CardDeclined,
        },
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            PaymentErrorCode::AuthenticationError
        }
        (StatusCode::NOT_FOUND, _) => PaymentErrorCode::NotFound,
        (StatusCode::TOO_MANY_REQUESTS, _) => PaymentErrorCode::RateLimitExceeded,
        (StatusCode::BAD_REQUEST, _) => PaymentErrorCode::InvalidRequest,
        (s, _) if s.is_server_error() => PaymentErrorCode::ProviderError,
        _ => PaymentErrorCode::Unknown,
    };

    let message = match code {
        PaymentErrorCode::CardDeclined => "The card was declined",
        PaymentErrorCode::InsufficientFunds => "The card has insufficient funds",
        PaymentErrorCode::AuthenticationError => "Payment provider rejected our credentials",
        PaymentErrorCode::NotFound => "Payment not found",
        PaymentErrorCode::RateLimitExceeded => "Payment provider is rate limiting requests",
        PaymentErrorCode::InvalidRequest => "Payment request was rejected",
        _ => "Payment provider error",
    };

    let mut error = PaymentError::new(code, message);
    if let Some(provider_code) = detail.decline_code.or(detail.code) {
        error = error.with_provider_code(provider_code);
    }
    if let Some(provider_message) = detail.message {
        tracing::debug!(provider_message = %provider_message, "Stripe error detail");
    }
    error
}

#[async_trait]
impl PaymentGateway for StripePaymentGateway {
    async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<Authorization, PaymentError> {
        let mut params = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        let intent: StripePaymentIntent = self
            .send(
                "authorize",
                self.http_client.post(self.url("payment_intents")).form(&params),
            )
            .await?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                "Stripe response is missing client_secret",
            )
        })?;

        tracing::debug!(reference = %intent.id, status = %intent.status, "payment intent created");

        Ok(Authorization {
            reference: intent.id,
            client_secret,
        })
    }

    async fn refund(&self, reference: &str, amount_minor: i64) -> Result<Refund, PaymentError> {
        let params = [
            ("payment_intent", reference.to_string()),
            ("amount", amount_minor.to_string()),
        ];

        let refund: StripeRefund = self
            .send(
                "refund",
                self.http_client.post(self.url("refunds")).form(&params),
            )
            .await?;

        Ok(Refund {
            refund_reference: refund.id,
            status: refund
                .status
                .as_deref()
                .map(RefundStatus::parse)
                .unwrap_or(RefundStatus::Pending),
        })
    }

    async fn confirm_status(&self, reference: &str) -> Result<PaymentIntentStatus, PaymentError> {
        let intent: StripePaymentIntent = self
            .send(
                "confirm_status",
                self.http_client
                    .get(self.url(&format!("payment_intents/{}", reference))),
            )
            .await?;

        Ok(PaymentIntentStatus::parse(&intent.status))
    }
}
