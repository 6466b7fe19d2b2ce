//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `catalog` - Plans, add-on services, discounts and billing intervals
//! - `pricing` - Pure pricing, proration and rounding
//! - `account` - Account membership references
//! - `membership` - Subscription lifecycle state machine

pub mod account;
pub mod catalog;
pub mod foundation;
pub mod membership;
pub mod pricing;
