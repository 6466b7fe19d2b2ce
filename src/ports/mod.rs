//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the lifecycle engine and the outside world. Adapters implement these ports.
//!
//! - `PaymentGateway` - authorize, refund and query charges
//! - `BookingStore` - Membership and Account persistence with version checks
//! - `CatalogReader` - read-only plans, add-ons and discounts
//! - `Clock` - current time

mod booking_store;
mod catalog_reader;
mod clock;
mod payment_gateway;

pub use booking_store::{BookingStore, WriteBatch};
pub use catalog_reader::CatalogReader;
pub use clock::{Clock, FixedClock, SystemClock};
pub use payment_gateway::{
    Authorization, AuthorizationRequest, PaymentError, PaymentErrorCode, PaymentGateway,
    PaymentIntentStatus, Refund, RefundStatus,
};
