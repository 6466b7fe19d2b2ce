//! Shared fixture for membership handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::adapters::memory::{InMemoryBookingStore, InMemoryCatalog};
use crate::adapters::stripe::MockPaymentGateway;
use crate::application::{KeyedLocks, LifecycleContext, TimedPaymentGateway};
use crate::domain::account::{Account, AccountRole};
use crate::domain::catalog::{AddonService, BillingInterval, Discount, Plan};
use crate::domain::foundation::{
    AccountId, DomainError, MembershipId, Percentage, PlanId, Timestamp,
};
use crate::domain::membership::{
    LifecyclePolicy, Membership, MembershipStatus, NewMembership, TimeSlot,
};
use crate::ports::{BookingStore, Clock, FixedClock, PaymentGateway, WriteBatch};

use super::{
    CancelMembershipCommand, CancelMembershipHandler, CreateMembershipCommand,
    CreateMembershipHandler, FreezeMembershipCommand, FreezeMembershipHandler,
    UnfreezeMembershipCommand, UnfreezeMembershipHandler,
};

pub(crate) struct Fixture {
    pub ctx: LifecycleContext,
    pub store: Arc<InMemoryBookingStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub gateway: MockPaymentGateway,
    pub clock: Arc<FixedClock>,
    pub account: AccountId,
    pub start: Timestamp,
    /// Base price 50.
    pub standard: Plan,
    /// Base price 100.
    pub premium: Plan,
    /// Price 10.
    pub sauna: AddonService,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(LifecyclePolicy::default(), MockPaymentGateway::new(), None).await
    }

    pub async fn with_policy(policy: LifecyclePolicy) -> Self {
        Self::build(policy, MockPaymentGateway::new(), None).await
    }

    /// Gateway answers after `delay`; calls are cut off after `timeout`.
    pub async fn with_gateway_delay(delay: Duration, timeout: Duration) -> Self {
        Self::build(
            LifecyclePolicy::default(),
            MockPaymentGateway::new().with_delay(delay),
            Some(timeout),
        )
        .await
    }

    /// Slow gateway without a timeout bound.
    pub async fn with_policy_and_delay(policy: LifecyclePolicy, delay: Duration) -> Self {
        Self::build(policy, MockPaymentGateway::new().with_delay(delay), None).await
    }

    async fn build(
        policy: LifecyclePolicy,
        gateway: MockPaymentGateway,
        timeout: Option<Duration>,
    ) -> Self {
        let start = Timestamp::from_unix_secs(1_717_200_000); // 2024-06-01
        let store = Arc::new(InMemoryBookingStore::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let clock = Arc::new(FixedClock::new(start));

        let standard = Plan::new("Standard", Decimal::from(50));
        let premium = Plan::new("Premium", Decimal::from(100));
        let sauna = AddonService::new("Sauna", Decimal::from(10), "wellness");
        catalog.add_plan(standard.clone()).await;
        catalog.add_plan(premium.clone()).await;
        catalog.add_addon(sauna.clone()).await;
        catalog
            .add_discount(Discount::new(
                "Quarterly 10",
                Percentage::whole(10),
                BillingInterval::Quarterly,
            ))
            .await;

        let gateway_port: Arc<dyn PaymentGateway> = match timeout {
            Some(limit) => Arc::new(TimedPaymentGateway::new(Arc::new(gateway.clone()), limit)),
            None => Arc::new(gateway.clone()),
        };

        let ctx = LifecycleContext {
            store: store.clone(),
            catalog: catalog.clone(),
            gateway: gateway_port,
            clock: clock.clone(),
            policy,
            currency: "usd".to_string(),
            locks: Arc::new(KeyedLocks::new()),
            slot_locks: Arc::new(KeyedLocks::new()),
        };

        let mut fx = Self {
            ctx,
            store,
            catalog,
            gateway,
            clock,
            account: AccountId::new(),
            start,
            standard,
            premium,
            sauna,
        };
        fx.account = fx.add_account().await;
        fx
    }

    pub async fn add_account(&self) -> AccountId {
        let id = AccountId::new();
        self.store
            .insert_account(&Account::new(id, AccountRole::Member))
            .await
            .unwrap();
        id
    }

    /// Standard plan, monthly, no add-ons: total 50.
    pub async fn purchase(&self) -> Membership {
        self.purchase_as(self.account, self.standard.id).await
    }

    pub async fn purchase_for(&self, account_id: AccountId) -> Membership {
        self.purchase_as(account_id, self.standard.id).await
    }

    pub async fn purchase_plan(&self, plan_id: PlanId) -> Membership {
        self.purchase_as(self.account, plan_id).await
    }

    async fn purchase_as(&self, account_id: AccountId, plan_id: PlanId) -> Membership {
        CreateMembershipHandler::new(self.ctx.clone())
            .handle(CreateMembershipCommand {
                account_id,
                plan_id,
                addon_ids: vec![],
                time_slot: "mon-18:00".into(),
                interval: "monthly".into(),
                goals: vec![],
            })
            .await
            .unwrap()
            .membership
    }

    /// Inserts a current membership with an arbitrary total and period length.
    pub async fn seed_membership(&self, total: Decimal, period_days: i64) -> Membership {
        let now = self.clock.now();
        let mut membership = Membership::purchase(
            NewMembership {
                account_id: self.account,
                plan_id: self.standard.id,
                addon_ids: vec![],
                interval: BillingInterval::Monthly,
                goals: vec![],
                time_slot: TimeSlot::new("mon-18:00").unwrap(),
                total_price: total,
                payment_reference: "pi_seeded".to_string(),
            },
            now,
        );
        membership.end_date = now.add_days(period_days);

        let mut account = self.store.find_account(&self.account).await.unwrap().unwrap();
        account.attach(membership.id);
        self.ctx.save_new(&membership, &mut account).await.unwrap();
        membership
    }

    pub async fn cancel(&self, account_id: AccountId) {
        CancelMembershipHandler::new(self.ctx.clone())
            .handle(CancelMembershipCommand { account_id })
            .await
            .unwrap();
    }

    pub async fn freeze(&self) {
        FreezeMembershipHandler::new(self.ctx.clone())
            .handle(FreezeMembershipCommand {
                account_id: self.account,
            })
            .await
            .unwrap();
    }

    pub async fn unfreeze(&self) {
        UnfreezeMembershipHandler::new(self.ctx.clone())
            .handle(UnfreezeMembershipCommand {
                account_id: self.account,
            })
            .await
            .unwrap();
    }

    pub async fn membership(&self, id: MembershipId) -> Membership {
        self.store.find_membership(&id).await.unwrap().unwrap()
    }

    /// Handlers see a store that rejects every commit after the next `allowed`.
    pub fn limit_commits(&mut self, allowed: usize) {
        self.ctx.store = Arc::new(CommitLimitStore {
            inner: self.store.clone(),
            allowed: AtomicUsize::new(allowed),
        });
    }
}

/// In-memory store whose commits start failing once the allowance is spent.
struct CommitLimitStore {
    inner: Arc<InMemoryBookingStore>,
    allowed: AtomicUsize,
}

#[async_trait]
impl BookingStore for CommitLimitStore {
    async fn insert_account(&self, account: &Account) -> Result<(), DomainError> {
        self.inner.insert_account(account).await
    }

    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.inner.find_account(id).await
    }

    async fn find_membership(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError> {
        self.inner.find_membership(id).await
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Membership>, DomainError> {
        self.inner.find_by_account(account_id).await
    }

    async fn find_by_time_slot_and_status(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<Vec<Membership>, DomainError> {
        self.inner.find_by_time_slot_and_status(slot, statuses).await
    }

    async fn count_by_time_slot(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<u64, DomainError> {
        self.inner.count_by_time_slot(slot, statuses).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError> {
        self.allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| DomainError::database("write rejected"))?;
        self.inner.commit(batch).await
    }
}
