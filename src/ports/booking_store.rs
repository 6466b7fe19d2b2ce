//! Booking store port for Membership and Account persistence.
//!
//! The store guarantees read-your-write consistency inside one lifecycle
//! call but offers no cross-operation locking. Every write carries the
//! version the caller read; a mismatch fails the whole batch with a
//! `ConcurrentModification` error and the stored version is bumped on success.
//!
//! # Example
//!
//! ```ignore
//! let mut membership = store.find_membership(&id).await?.ok_or(...)?;
//! membership.freeze(clock.now())?;
//! store.update_membership(&membership).await?;
//! ```

use async_trait::async_trait;

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, DomainError, MembershipId};
use crate::domain::membership::{Membership, MembershipStatus, TimeSlot};

/// Writes applied atomically by [`BookingStore::commit`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub insert_memberships: Vec<Membership>,
    pub update_memberships: Vec<Membership>,
    pub update_accounts: Vec<Account>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_membership(mut self, membership: Membership) -> Self {
        self.insert_memberships.push(membership);
        self
    }

    pub fn update_membership(mut self, membership: Membership) -> Self {
        self.update_memberships.push(membership);
        self
    }

    pub fn update_account(mut self, account: Account) -> Self {
        self.update_accounts.push(account);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.insert_memberships.is_empty()
            && self.update_memberships.is_empty()
            && self.update_accounts.is_empty()
    }
}

/// Port for Membership and Account persistence.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Register an account.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the account already exists
    async fn insert_account(&self, account: &Account) -> Result<(), DomainError>;

    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    async fn find_membership(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError>;

    /// All memberships of an account, current and historical, oldest first.
    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Membership>, DomainError>;

    /// Memberships in `slot` whose status is one of `statuses`.
    async fn find_by_time_slot_and_status(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<Vec<Membership>, DomainError>;

    /// Number of memberships in `slot` whose status is one of `statuses`.
    async fn count_by_time_slot(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<u64, DomainError>;

    /// Apply all writes in `batch` or none of them.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if any update's version is stale
    /// - `MembershipNotFound` / `AccountNotFound` if an updated record is absent
    /// - `DatabaseError` on persistence failure
    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError>;

    /// Insert a single membership.
    async fn insert_membership(&self, membership: &Membership) -> Result<(), DomainError> {
        self.commit(WriteBatch::new().insert_membership(membership.clone()))
            .await
    }

    /// Update a single membership.
    async fn update_membership(&self, membership: &Membership) -> Result<(), DomainError> {
        self.commit(WriteBatch::new().update_membership(membership.clone()))
            .await
    }

    /// Update a single account.
    async fn update_account(&self, account: &Account) -> Result<(), DomainError> {
        self.commit(WriteBatch::new().update_account(account.clone()))
            .await
    }
}
