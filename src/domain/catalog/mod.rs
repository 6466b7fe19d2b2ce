//! Catalog domain module.
//!
//! Read-only inputs to pricing, owned by the external catalog subsystem.
//!
//! - `interval` - BillingInterval and its multiplier/day tables
//! - `plan` - Plan, AddonService, Discount records

mod interval;
mod plan;

pub use interval::{BillingInterval, UnknownInterval};
pub use plan::{select_discount, AddonService, Discount, Plan};
