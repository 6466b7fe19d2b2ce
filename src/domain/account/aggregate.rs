//! Account aggregate as seen by the membership lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, MembershipId};

/// Role assigned by the identity subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Member,
    Trainer,
    Admin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Member => "member",
            AccountRole::Trainer => "trainer",
            AccountRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "member" => Some(AccountRole::Member),
            "trainer" => Some(AccountRole::Trainer),
            "admin" => Some(AccountRole::Admin),
            _ => None,
        }
    }
}

/// Account with its membership references.
///
/// # Invariants
///
/// - `current_membership`, when set, points at an Active or Frozen membership
/// - `membership_history` is append-only and never contains the current id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub role: AccountRole,
    pub current_membership: Option<MembershipId>,
    pub membership_history: Vec<MembershipId>,
    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: u64,
}

impl Account {
    pub fn new(id: AccountId, role: AccountRole) -> Self {
        Self {
            id,
            role,
            current_membership: None,
            membership_history: Vec::new(),
            version: 0,
        }
    }

    /// Makes `membership_id` current.
    ///
    /// A previous current membership is moved to history and returned.
    pub fn attach(&mut self, membership_id: MembershipId) -> Option<MembershipId> {
        let previous = self.current_membership.replace(membership_id);
        if let Some(prev) = previous {
            if prev != membership_id {
                self.membership_history.push(prev);
            }
        }
        previous.filter(|prev| *prev != membership_id)
    }

    /// Moves `membership_id` from current to history.
    ///
    /// Returns false when it was not the current membership.
    pub fn release(&mut self, membership_id: MembershipId) -> bool {
        if self.current_membership != Some(membership_id) {
            return false;
        }
        self.current_membership = None;
        self.membership_history.push(membership_id);
        true
    }

    pub fn has_current(&self) -> bool {
        self.current_membership.is_some()
    }
}
