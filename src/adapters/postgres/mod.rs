//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresBookingStore` - accounts and memberships with optimistic versioning
//! - `PostgresCatalog` - read-only plans, add-ons and discounts
//!
//! Schema lives in `migrations/`.

mod booking_store;
mod catalog;

pub use booking_store::PostgresBookingStore;
pub use catalog::PostgresCatalog;
