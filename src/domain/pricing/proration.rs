//! Proration, refund and rounding arithmetic.
//!
//! Day counts are whole days. Results keep full precision until
//! [`round_minor`] is applied at the payment boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::PricingError;

/// Number of decimal places in the minor currency unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Rounds an amount to the nearest minor unit, halves away from zero.
pub fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount to integer minor units (e.g. cents) for the gateway.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PricingError> {
    (round_minor(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(PricingError::Overflow("minor units"))
}

/// Converts integer minor units back to a decimal amount.
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Day-count view of a membership period at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPosition {
    /// Whole days from start to now (negative before start).
    pub days_since_start: i64,
    /// Whole days from now to end, floored at zero.
    pub days_remaining: i64,
    /// Whole days from start to end, at least one.
    pub total_days: i64,
}

impl PeriodPosition {
    pub fn at(start: Timestamp, end: Timestamp, now: Timestamp) -> Self {
        Self {
            days_since_start: now.days_since(&start),
            days_remaining: end.days_since(&now).max(0),
            total_days: end.days_since(&start).max(1),
        }
    }

    /// Fraction of the period still ahead, in `[0, 1]`.
    pub fn remaining_fraction(&self) -> Decimal {
        let remaining = self.days_remaining.min(self.total_days);
        Decimal::from(remaining) / Decimal::from(self.total_days)
    }

    /// Scales `amount` by the fraction of the period remaining.
    pub fn prorate(&self, amount: Decimal) -> Decimal {
        amount * self.remaining_fraction()
    }
}

/// Refund owed when cancelling.
///
/// Full `total` inside the grace window (`days_since_start ≤ full_refund_days`),
/// otherwise `total × days_remaining / total_days`.
pub fn cancellation_refund(total: Decimal, position: PeriodPosition, full_refund_days: i64) -> Decimal {
    if position.days_since_start <= full_refund_days {
        total
    } else {
        position.prorate(total)
    }
}

/// Monetary consequence of changing a membership's configuration mid-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum AdjustmentAction {
    /// Customer owes the difference.
    Charge(Decimal),
    /// Customer is owed the difference.
    Refund(Decimal),
    /// Difference within epsilon.
    None,
}

/// Prorated comparison between the current and a proposed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanChangeQuote {
    pub current_value: Decimal,
    pub proposed_value: Decimal,
    pub action: AdjustmentAction,
}

impl PlanChangeQuote {
    /// Values the remaining period under both totals and decides the action.
    ///
    /// Differences whose magnitude does not exceed `epsilon` yield no action.
    pub fn compute(
        position: PeriodPosition,
        current_total: Decimal,
        proposed_total: Decimal,
        epsilon: Decimal,
    ) -> Self {
        let current_value = position.prorate(current_total);
        let proposed_value = position.prorate(proposed_total);
        let difference = proposed_value - current_value;

        let action = if difference > epsilon {
            AdjustmentAction::Charge(difference)
        } else if difference < -epsilon {
            AdjustmentAction::Refund(difference.abs())
        } else {
            AdjustmentAction::None
        };

        Self {
            current_value,
            proposed_value,
            action,
        }
    }

    pub fn difference(&self) -> Decimal {
        self.proposed_value - self.current_value
    }
}
