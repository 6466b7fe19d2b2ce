//! In-memory BookingStore.
//!
//! A single write lock covers each commit, so batches are atomic and
//! version checks are exact.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, DomainError, ErrorCode, MembershipId};
use crate::domain::membership::{Membership, MembershipStatus, TimeSlot};
use crate::ports::{BookingStore, WriteBatch};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    memberships: HashMap<MembershipId, Membership>,
}

/// BookingStore backed by hash maps.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored memberships, across all accounts.
    pub async fn membership_count(&self) -> usize {
        self.tables.read().await.memberships.len()
    }

    fn check_batch(tables: &Tables, batch: &WriteBatch) -> Result<(), DomainError> {
        for membership in &batch.insert_memberships {
            if tables.memberships.contains_key(&membership.id) {
                return Err(DomainError::new(
                    ErrorCode::ValidationFailed,
                    format!("Membership {} already exists", membership.id),
                ));
            }
        }
        for membership in &batch.update_memberships {
            let stored = tables.memberships.get(&membership.id).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::MembershipNotFound,
                    format!("Membership not found: {}", membership.id),
                )
            })?;
            if stored.version != membership.version {
                return Err(DomainError::conflict("Membership", membership.id));
            }
        }
        for account in &batch.update_accounts {
            let stored = tables.accounts.get(&account.id).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AccountNotFound,
                    format!("Account not found: {}", account.id),
                )
            })?;
            if stored.version != account.version {
                return Err(DomainError::conflict("Account", account.id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_account(&self, account: &Account) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if tables.accounts.contains_key(&account.id) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Account {} already exists", account.id),
            ));
        }
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        Ok(self.tables.read().await.accounts.get(id).cloned())
    }

    async fn find_membership(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError> {
        Ok(self.tables.read().await.memberships.get(id).cloned())
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Membership>, DomainError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Membership> = tables
            .memberships
            .values()
            .filter(|m| &m.account_id == account_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn find_by_time_slot_and_status(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<Vec<Membership>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .filter(|m| &m.time_slot == slot && statuses.contains(&m.status))
            .cloned()
            .collect())
    }

    async fn count_by_time_slot(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .filter(|m| &m.time_slot == slot && statuses.contains(&m.status))
            .count() as u64)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        Self::check_batch(&tables, &batch)?;

        for membership in batch.insert_memberships {
            tables.memberships.insert(membership.id, membership);
        }
        for mut membership in batch.update_memberships {
            membership.version += 1;
            tables.memberships.insert(membership.id, membership);
        }
        for mut account in batch.update_accounts {
            account.version += 1;
            tables.accounts.insert(account.id, account);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountRole;
    use crate::domain::catalog::BillingInterval;
    use crate::domain::foundation::{PlanId, Timestamp};
    use crate::domain::membership::NewMembership;
    use rust_decimal::Decimal;

    fn membership(account_id: AccountId, slot: &str) -> Membership {
        Membership::purchase(
            NewMembership {
                account_id,
                plan_id: PlanId::new(),
                addon_ids: vec![],
                interval: BillingInterval::Monthly,
                goals: vec![],
                time_slot: TimeSlot::new(slot).unwrap(),
                total_price: Decimal::from(40),
                payment_reference: "pi_1".into(),
            },
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writes() {
        let store = InMemoryBookingStore::new();
        let account = Account::new(AccountId::new(), AccountRole::Member);
        store.insert_account(&account).await.unwrap();
        let m = membership(account.id, "mon-18:00");
        store.insert_membership(&m).await.unwrap();

        let mut first = store.find_membership(&m.id).await.unwrap().unwrap();
        let stale = first.clone();
        first.freeze(Timestamp::now()).unwrap();
        store.update_membership(&first).await.unwrap();

        let stored = store.find_membership(&m.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.status, MembershipStatus::Frozen);

        let err = store.update_membership(&stale).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConcurrentModification);
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = InMemoryBookingStore::new();
        let mut account = Account::new(AccountId::new(), AccountRole::Member);
        store.insert_account(&account).await.unwrap();

        let m = membership(account.id, "mon-18:00");
        account.attach(m.id);
        account.version = 7;

        let err = store
            .commit(
                WriteBatch::new()
                    .insert_membership(m.clone())
                    .update_account(account),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ConcurrentModification);
        assert!(store.find_membership(&m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slot_queries_filter_by_status() {
        let store = InMemoryBookingStore::new();
        let account_id = AccountId::new();
        let slot = TimeSlot::new("tue-07:00").unwrap();

        let active = membership(account_id, "tue-07:00");
        let mut cancelled = membership(account_id, "tue-07:00");
        cancelled.cancel(Timestamp::now()).unwrap();
        let elsewhere = membership(account_id, "wed-07:00");
        for m in [&active, &cancelled, &elsewhere] {
            store.insert_membership(m).await.unwrap();
        }

        let live = [MembershipStatus::Active, MembershipStatus::Frozen];
        assert_eq!(store.count_by_time_slot(&slot, &live).await.unwrap(), 1);
        let found = store
            .find_by_time_slot_and_status(&slot, &[MembershipStatus::Cancelled])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, cancelled.id);
        assert_eq!(store.find_by_account(&account_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn duplicate_account_is_rejected() {
        let store = InMemoryBookingStore::new();
        let account = Account::new(AccountId::new(), AccountRole::Member);
        store.insert_account(&account).await.unwrap();
        assert!(store.insert_account(&account).await.is_err());
    }
}
