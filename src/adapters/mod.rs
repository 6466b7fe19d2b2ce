//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-memory store and catalog (tests, development)
//! - `postgres` - PostgreSQL store and catalog (sqlx)
//! - `stripe` - Stripe payment gateway and a scriptable mock
//! - `http` - Axum REST endpoints

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use memory::{InMemoryBookingStore, InMemoryCatalog};
pub use postgres::{PostgresBookingStore, PostgresCatalog};
pub use stripe::{MockPaymentGateway, StripeConfig, StripePaymentGateway};
