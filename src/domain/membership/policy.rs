//! Tunable lifecycle rules.
//!
//! The freeze credit cap and the freeze-status ceiling are separate knobs.
//! They default to the same value so that `remaining_freeze_days` reports the
//! budget `unfreeze` actually honours; the legacy 90-day ceiling is available
//! as [`LEGACY_FREEZE_STATUS_CEILING_DAYS`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shortest freeze that may be ended.
pub const MIN_FREEZE_DAYS: i64 = 7;

/// Largest end-date credit granted for one freeze episode.
pub const MAX_FREEZE_CREDIT_DAYS: i64 = 50;

/// Budget reported by the freeze-status query.
pub const FREEZE_STATUS_CEILING_DAYS: i64 = MAX_FREEZE_CREDIT_DAYS;

/// Budget the freeze-status query used historically.
pub const LEGACY_FREEZE_STATUS_CEILING_DAYS: i64 = 90;

/// Days after start within which cancellation refunds in full.
pub const FULL_REFUND_WINDOW_DAYS: i64 = 7;

/// Concurrent live memberships allowed per time slot.
pub const DEFAULT_SLOT_CAPACITY: u32 = 20;

/// Price differences at or below this amount trigger no money movement.
pub fn default_edit_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Rules applied by the lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub min_freeze_days: i64,
    pub max_freeze_credit_days: i64,
    pub freeze_status_ceiling_days: i64,
    pub full_refund_window_days: i64,
    pub edit_epsilon: Decimal,
    pub slot_capacity: u32,
    /// Reject a purchase while the account already has a live membership.
    pub reject_second_active: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            min_freeze_days: MIN_FREEZE_DAYS,
            max_freeze_credit_days: MAX_FREEZE_CREDIT_DAYS,
            freeze_status_ceiling_days: FREEZE_STATUS_CEILING_DAYS,
            full_refund_window_days: FULL_REFUND_WINDOW_DAYS,
            edit_epsilon: default_edit_epsilon(),
            slot_capacity: DEFAULT_SLOT_CAPACITY,
            reject_second_active: true,
        }
    }
}

impl LifecyclePolicy {
    /// End-date credit for a freeze of `duration_days`.
    pub fn freeze_credit(&self, duration_days: i64) -> i64 {
        duration_days.clamp(0, self.max_freeze_credit_days)
    }

    /// Days of freeze budget left after `duration_days`, never negative.
    pub fn remaining_freeze_days(&self, duration_days: i64) -> i64 {
        (self.freeze_status_ceiling_days - duration_days).max(0)
    }
}
