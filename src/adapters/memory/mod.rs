//! In-memory adapters for tests and single-process development.
//!
//! Not suitable for production: state is lost on restart.

mod booking_store;
mod catalog;

pub use booking_store::InMemoryBookingStore;
pub use catalog::InMemoryCatalog;
