//! Payment ledger entries.
//!
//! Each authorization taken for a membership is kept as its own record so
//! refunds can be issued against the charge that actually holds the money.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::PaymentStatus;

/// What a charge paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentPurpose {
    Purchase,
    Extension { months: u32 },
    Upgrade,
}

/// One authorization against the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub reference: String,
    /// Authorized amount in major units, already rounded to minor units.
    pub amount: Decimal,
    /// Sum of refunds issued against this charge.
    pub refunded: Decimal,
    pub purpose: PaymentPurpose,
    pub status: PaymentStatus,
    pub created_at: Timestamp,
}

impl PaymentRecord {
    pub fn pending(
        reference: String,
        amount: Decimal,
        purpose: PaymentPurpose,
        now: Timestamp,
    ) -> Self {
        Self {
            reference,
            amount,
            refunded: Decimal::ZERO,
            purpose,
            status: PaymentStatus::Pending,
            created_at: now,
        }
    }

    /// Amount that can still be returned on this charge.
    pub fn refundable(&self) -> Decimal {
        (self.amount - self.refunded).max(Decimal::ZERO)
    }
}

/// One leg of a refund, bound to a single charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAllocation {
    pub reference: String,
    pub amount: Decimal,
}

/// Split of a refund across the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPlan {
    pub legs: Vec<RefundAllocation>,
    /// Part of the requested amount no charge can cover.
    pub unallocated: Decimal,
}

/// Spreads `amount` over the charges, newest first.
///
/// Each leg is capped at what is still refundable on its charge.
pub fn allocate_refund(payments: &[PaymentRecord], amount: Decimal) -> RefundPlan {
    let mut remaining = amount.max(Decimal::ZERO);
    let mut legs = Vec::new();

    for record in payments.iter().rev() {
        if remaining <= Decimal::ZERO {
            break;
        }
        let take = record.refundable().min(remaining);
        if take > Decimal::ZERO {
            legs.push(RefundAllocation {
                reference: record.reference.clone(),
                amount: take,
            });
            remaining -= take;
        }
    }

    RefundPlan {
        legs,
        unallocated: remaining,
    }
}
