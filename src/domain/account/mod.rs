//! Account domain module.
//!
//! Accounts are registered and authenticated elsewhere; the lifecycle engine
//! only maintains the current-membership reference and the history list.

mod aggregate;

pub use aggregate::{Account, AccountRole};
