//! Membership lifecycle and payment status enums.
//!
//! Active and Frozen are the live states; Cancelled and Expired are terminal.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Purchased and running.
    Active,

    /// Paused by the member. The end date is credited on unfreeze.
    Frozen,

    /// Ended by the member. Terminal.
    Cancelled,

    /// End date passed while Active. Terminal, reached only by time.
    Expired,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 4] = [
        MembershipStatus::Active,
        MembershipStatus::Frozen,
        MembershipStatus::Cancelled,
        MembershipStatus::Expired,
    ];

    /// Active or Frozen; the statuses that occupy a slot and may be current.
    pub fn is_live(&self) -> bool {
        matches!(self, MembershipStatus::Active | MembershipStatus::Frozen)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Frozen => "frozen",
            MembershipStatus::Cancelled => "cancelled",
            MembershipStatus::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            (Active, Frozen) | (Active, Cancelled) | (Active, Expired)
                | (Frozen, Active)
                | (Frozen, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Active => vec![Frozen, Cancelled, Expired],
            Frozen => vec![Active, Cancelled],
            Cancelled | Expired => vec![],
        }
    }
}

/// Settlement state of the most recent charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Authorization requested, capture not yet confirmed.
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}
