//! Membership handlers.
//!
//! Command and query handlers for the membership lifecycle:
//!
//! ## Commands
//! - Purchasing, freezing, unfreezing, cancelling
//! - Extending by whole months
//! - Changing plan and add-ons mid-period
//! - Confirming a pending payment
//!
//! ## Queries
//! - Current membership and history
//! - Freeze status
//! - Time-slot availability

mod cancel_membership;
mod check_availability;
mod confirm_payment;
mod create_membership;
mod edit_membership;
mod extend_membership;
mod freeze_membership;
mod get_freeze_status;
mod get_membership;
mod unfreeze_membership;

#[cfg(test)]
pub(crate) mod test_support;

// Commands
pub use cancel_membership::{
    CancelMembershipCommand, CancelMembershipHandler, CancelMembershipResult, RefundOutcome,
};
pub use confirm_payment::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult};
pub use create_membership::{
    CreateMembershipCommand, CreateMembershipHandler, CreateMembershipResult,
};
pub use edit_membership::{
    EditMembershipCommand, EditMembershipHandler, EditMembershipResult, EditRefund,
};
pub use extend_membership::{
    ExtendMembershipCommand, ExtendMembershipHandler, ExtendMembershipResult,
};
pub use freeze_membership::{
    FreezeMembershipCommand, FreezeMembershipHandler, FreezeMembershipResult,
};
pub use unfreeze_membership::{
    UnfreezeMembershipCommand, UnfreezeMembershipHandler, UnfreezeMembershipResult,
};

// Queries
pub use check_availability::{
    CheckAvailabilityHandler, CheckAvailabilityQuery, CheckAvailabilityResult,
};
pub use get_freeze_status::{GetFreezeStatusHandler, GetFreezeStatusQuery};
pub use get_membership::{GetMembershipHandler, GetMembershipQuery, GetMembershipResult};
