//! Mock payment gateway for tests and local development.
//!
//! Supports:
//! - Error injection (one-shot or per method)
//! - Artificial latency
//! - Call tracking with recorded authorization and refund requests
//! - Scripted payment intent status

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    Authorization, AuthorizationRequest, PaymentError, PaymentGateway, PaymentIntentStatus, Refund,
    RefundStatus,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new();
/// mock.set_method_error("refund", PaymentError::network("down"));
///
/// let auth = mock.authorize(AuthorizationRequest::new(1000, "usd")).await?;
/// mock.complete(&auth.reference);
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    intents: HashMap<String, PaymentIntentStatus>,
    authorizations: Vec<AuthorizationRequest>,
    refunds: Vec<RecordedRefund>,
    next_refund_status: Option<RefundStatus>,
    next_error: Option<PaymentError>,
    method_errors: HashMap<String, PaymentError>,
    reference_errors: HashMap<String, PaymentError>,
    call_log: Vec<MethodCall>,
    sequence: u64,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// Refund request received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRefund {
    pub reference: String,
    pub amount_minor: i64,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    // Configuration

    /// Fail the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Fail every call to `method` until cleared.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Fail refunds and status checks against `reference` until cleared.
    pub fn set_reference_error(&self, reference: &str, error: PaymentError) {
        self.state()
            .reference_errors
            .insert(reference.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
        state.reference_errors.clear();
    }

    /// Status reported for the next refund (default `Succeeded`).
    pub fn set_next_refund_status(&self, status: RefundStatus) {
        self.state().next_refund_status = Some(status);
    }

    /// Mark an authorization as paid.
    pub fn complete(&self, reference: &str) {
        self.set_intent_status(reference, PaymentIntentStatus::Succeeded);
    }

    pub fn set_intent_status(&self, reference: &str, status: PaymentIntentStatus) {
        self.state().intents.insert(reference.to_string(), status);
    }

    // Call tracking

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn authorizations(&self) -> Vec<AuthorizationRequest> {
        self.state().authorizations.clone()
    }

    pub fn refunds(&self) -> Vec<RecordedRefund> {
        self.state().refunds.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state();
        state.call_log.clear();
        state.authorizations.clear();
        state.refunds.clear();
    }

    // Internal helpers

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn enter(&self, method: &str, args: Vec<String>) -> Result<(), PaymentError> {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<Authorization, PaymentError> {
        self.enter(
            "authorize",
            vec![request.amount_minor.to_string(), request.currency.clone()],
        )
        .await?;

        let mut state = self.state();
        state.sequence += 1;
        let reference = format!("pi_mock_{}", state.sequence);
        state
            .intents
            .insert(reference.clone(), PaymentIntentStatus::RequiresPaymentMethod);
        state.authorizations.push(request);

        Ok(Authorization {
            client_secret: format!("{}_secret_mock", reference),
            reference,
        })
    }

    async fn refund(&self, reference: &str, amount_minor: i64) -> Result<Refund, PaymentError> {
        self.enter(
            "refund",
            vec![reference.to_string(), amount_minor.to_string()],
        )
        .await?;

        let mut state = self.state();
        if let Some(error) = state.reference_errors.get(reference) {
            return Err(error.clone());
        }
        state.sequence += 1;
        let refund_reference = format!("re_mock_{}", state.sequence);
        let status = state
            .next_refund_status
            .take()
            .unwrap_or(RefundStatus::Succeeded);
        state.refunds.push(RecordedRefund {
            reference: reference.to_string(),
            amount_minor,
        });

        Ok(Refund {
            refund_reference,
            status,
        })
    }

    async fn confirm_status(&self, reference: &str) -> Result<PaymentIntentStatus, PaymentError> {
        self.enter("confirm_status", vec![reference.to_string()])
            .await?;

        let state = self.state();
        if let Some(error) = state.reference_errors.get(reference) {
            return Err(error.clone());
        }
        state
            .intents
            .get(reference)
            .copied()
            .ok_or_else(|| PaymentError::not_found("payment intent"))
    }
}
