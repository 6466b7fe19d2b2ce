//! Stripe payment gateway adapter.
//!
//! - `StripePaymentGateway` - PaymentIntent-based implementation of the
//!   `PaymentGateway` port
//! - `MockPaymentGateway` - scriptable in-process gateway for tests and
//!   local development
//!
//! # Configuration
//!
//! Required for the Stripe gateway:
//! - `MEMBERSHIP_BILLING__PAYMENT__STRIPE_API_KEY`: Stripe secret API key

mod mock_gateway;
mod stripe_gateway;

pub use mock_gateway::{MethodCall, MockPaymentGateway, RecordedRefund};
pub use stripe_gateway::{StripeConfig, StripePaymentGateway};
