//! Payment gateway decorator that bounds every call.
//!
//! A call that outlives the bound fails with `PaymentErrorCode::Timeout`;
//! callers treat it like any other gateway failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    Authorization, AuthorizationRequest, PaymentError, PaymentGateway, PaymentIntentStatus, Refund,
};

pub struct TimedPaymentGateway {
    inner: Arc<dyn PaymentGateway>,
    timeout: Duration,
}

impl TimedPaymentGateway {
    pub fn new(inner: Arc<dyn PaymentGateway>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, PaymentError>
    where
        F: std::future::Future<Output = Result<T, PaymentError>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "payment gateway call timed out"
                );
                Err(PaymentError::timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for TimedPaymentGateway {
    async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<Authorization, PaymentError> {
        self.bounded("authorize", self.inner.authorize(request)).await
    }

    async fn refund(&self, reference: &str, amount_minor: i64) -> Result<Refund, PaymentError> {
        self.bounded("refund", self.inner.refund(reference, amount_minor))
            .await
    }

    async fn confirm_status(&self, reference: &str) -> Result<PaymentIntentStatus, PaymentError> {
        self.bounded("confirm_status", self.inner.confirm_status(reference))
            .await
    }
}
