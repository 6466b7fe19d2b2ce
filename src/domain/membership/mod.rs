//! Membership domain module.
//!
//! Subscription instances and the rules governing their lifecycle.
//!
//! # Module Structure
//!
//! - `aggregate` - Membership aggregate entity
//! - `status` - MembershipStatus state machine and PaymentStatus
//! - `freeze` - freeze records and the freeze-status projection
//! - `payment` - per-charge payment ledger and refund allocation
//! - `policy` - tunable lifecycle constants
//! - `time_slot` - TimeSlot value object
//! - `errors` - MembershipError taxonomy

mod aggregate;
mod errors;
mod freeze;
mod payment;
mod policy;
mod status;
mod time_slot;

pub use aggregate::{Membership, NewMembership, PlanChange};
pub use errors::{MembershipError, Resource};
pub use freeze::{FreezeRecord, FreezeStatus, UnfreezeOutcome};
pub use payment::{
    allocate_refund, PaymentPurpose, PaymentRecord, RefundAllocation, RefundPlan,
};
pub use policy::{
    LifecyclePolicy, FREEZE_STATUS_CEILING_DAYS, FULL_REFUND_WINDOW_DAYS,
    LEGACY_FREEZE_STATUS_CEILING_DAYS, MAX_FREEZE_CREDIT_DAYS, MIN_FREEZE_DAYS,
};
pub use status::{MembershipStatus, PaymentStatus};
pub use time_slot::TimeSlot;
