//! Shared dependencies and helpers for lifecycle handlers.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use crate::domain::account::Account;
use crate::domain::catalog::{select_discount, AddonService, BillingInterval, Plan};
use crate::domain::foundation::{AccountId, AddonId, PlanId};
use crate::domain::membership::{
    LifecyclePolicy, Membership, MembershipError, RefundAllocation, Resource, TimeSlot,
};
use crate::domain::pricing::{to_minor_units, PricingEngine};
use crate::ports::{
    Authorization, AuthorizationRequest, BookingStore, CatalogReader, Clock, PaymentError,
    PaymentGateway, RefundStatus, WriteBatch,
};

use super::KeyedLocks;

/// Everything a lifecycle handler needs.
///
/// `gateway` is expected to be bounded by a timeout (see `TimedPaymentGateway`).
#[derive(Clone)]
pub struct LifecycleContext {
    pub store: Arc<dyn BookingStore>,
    pub catalog: Arc<dyn CatalogReader>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
    pub policy: LifecyclePolicy,
    pub currency: String,
    pub locks: Arc<KeyedLocks<AccountId>>,
    /// Held while a purchase checks and fills slot capacity.
    pub slot_locks: Arc<KeyedLocks<TimeSlot>>,
}

/// A validated plan with its selected add-ons.
#[derive(Debug, Clone)]
pub struct Selection {
    pub plan: Plan,
    pub addons: Vec<AddonService>,
}

impl Selection {
    pub fn addon_ids(&self) -> Vec<AddonId> {
        self.addons.iter().map(|a| a.id).collect()
    }
}

/// A refund the gateway accepted against one charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRefund {
    pub payment_reference: String,
    pub refund_reference: String,
    pub amount: Decimal,
    pub status: RefundStatus,
}

/// Outcome of refunding several charges in turn.
#[derive(Debug, Clone, Default)]
pub struct RefundRun {
    pub issued: Vec<IssuedRefund>,
    /// First gateway error; later legs were not attempted.
    pub failure: Option<PaymentError>,
}

impl LifecycleContext {
    /// Serializes lifecycle calls for one account.
    pub async fn lock(&self, account_id: AccountId) -> OwnedMutexGuard<()> {
        self.locks.lock(account_id).await
    }

    pub async fn lock_slot(&self, slot: &TimeSlot) -> OwnedMutexGuard<()> {
        self.slot_locks.lock(slot.clone()).await
    }

    pub async fn load_account(&self, account_id: AccountId) -> Result<Account, MembershipError> {
        self.store
            .find_account(&account_id)
            .await?
            .ok_or_else(|| MembershipError::not_found(Resource::Account, account_id))
    }

    /// Loads the account's current membership, applying lazy expiry.
    ///
    /// An expired membership is persisted as Expired and moved to the
    /// account's history, then returned so the caller's transition fails.
    pub async fn load_current(&self, account: &mut Account) -> Result<Membership, MembershipError> {
        let membership_id = account
            .current_membership
            .ok_or_else(|| MembershipError::no_current_membership(account.id))?;

        let mut membership = self
            .store
            .find_membership(&membership_id)
            .await?
            .ok_or_else(|| MembershipError::not_found(Resource::Membership, membership_id))?;

        if membership.refresh_expiry(self.clock.now()) {
            account.release(membership.id);
            self.save(&mut membership, Some(&mut *account)).await?;
            tracing::info!(
                membership_id = %membership.id,
                account_id = %account.id,
                end_date = %membership.end_date,
                "membership expired"
            );
        }

        Ok(membership)
    }

    /// Persists an updated membership (and account) and bumps local versions.
    pub async fn save(
        &self,
        membership: &mut Membership,
        account: Option<&mut Account>,
    ) -> Result<(), MembershipError> {
        let mut batch = WriteBatch::new().update_membership(membership.clone());
        if let Some(account) = account.as_deref() {
            batch = batch.update_account(account.clone());
        }

        self.commit(batch).await?;

        membership.version += 1;
        if let Some(account) = account {
            account.version += 1;
        }
        Ok(())
    }

    /// Persists a new membership together with its account.
    pub async fn save_new(
        &self,
        membership: &Membership,
        account: &mut Account,
    ) -> Result<(), MembershipError> {
        self.commit(
            WriteBatch::new()
                .insert_membership(membership.clone())
                .update_account(account.clone()),
        )
        .await?;
        account.version += 1;
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), MembershipError> {
        self.store.commit(batch).await.map_err(|e| {
            let err = MembershipError::from(e);
            match &err {
                MembershipError::Conflict(msg) => {
                    tracing::warn!(error = %msg, "optimistic version check failed")
                }
                other => tracing::error!(error = %other, "failed to persist membership"),
            }
            err
        })
    }

    /// Resolves a plan and add-on selection, rejecting missing or inactive entries.
    ///
    /// Duplicate add-on ids count once.
    pub async fn resolve_selection(
        &self,
        plan_id: PlanId,
        addon_ids: &[AddonId],
    ) -> Result<Selection, MembershipError> {
        let plan = self
            .catalog
            .find_plan(&plan_id)
            .await?
            .ok_or_else(|| MembershipError::not_found(Resource::Plan, plan_id))?;
        if !plan.active {
            return Err(MembershipError::validation(
                "plan_id",
                format!("plan '{}' is not available", plan.name),
            ));
        }

        let mut seen = HashSet::new();
        let wanted: Vec<AddonId> = addon_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let found = self.catalog.find_addons(&wanted).await?;
        let mut addons = Vec::with_capacity(wanted.len());
        for id in wanted {
            let addon = found
                .iter()
                .find(|a| a.id == id)
                .ok_or_else(|| MembershipError::not_found(Resource::Addon, id))?;
            if !addon.active {
                return Err(MembershipError::validation(
                    "addon_ids",
                    format!("add-on '{}' is not available", addon.name),
                ));
            }
            addons.push(addon.clone());
        }

        Ok(Selection { plan, addons })
    }

    /// Prices a selection with the first active discount for `interval`.
    pub async fn price(
        &self,
        selection: &Selection,
        interval: BillingInterval,
    ) -> Result<Decimal, MembershipError> {
        let discounts = self.catalog.discounts_for(interval).await?;
        let discount = select_discount(&discounts, interval);
        Ok(PricingEngine::compute_total(
            &selection.plan,
            &selection.addons,
            interval,
            discount,
        )?)
    }

    /// Prices `selection` over the membership's whole current period.
    ///
    /// One base interval plus every recorded extension, each re-costed on the
    /// selection's plan with the discount active for its interval.
    pub async fn price_period(
        &self,
        selection: &Selection,
        membership: &Membership,
    ) -> Result<Decimal, MembershipError> {
        let mut total = self.price(selection, membership.interval).await?;
        let extensions: Vec<u32> = membership.extension_months().collect();
        for months in extensions {
            let interval = PricingEngine::extension_interval(months)?;
            let discounts = self.catalog.discounts_for(interval).await?;
            let (_, cost) = PricingEngine::extension_cost(
                &selection.plan,
                months,
                select_discount(&discounts, interval),
            )?;
            total += cost;
        }
        Ok(total)
    }

    /// Issues one gateway refund per leg, stopping at the first error.
    pub async fn refund_legs(&self, legs: &[RefundAllocation]) -> Result<RefundRun, MembershipError> {
        let mut run = RefundRun::default();
        for leg in legs {
            let amount_minor = to_minor_units(leg.amount)?;
            match self.gateway.refund(&leg.reference, amount_minor).await {
                Ok(refund) => run.issued.push(IssuedRefund {
                    payment_reference: leg.reference.clone(),
                    refund_reference: refund.refund_reference,
                    amount: leg.amount,
                    status: refund.status,
                }),
                Err(e) => {
                    tracing::warn!(
                        payment_reference = %leg.reference,
                        code = %e.code,
                        provider_code = e.provider_code.as_deref().unwrap_or("-"),
                        error = %e.message,
                        "refund failed"
                    );
                    run.failure = Some(e);
                    break;
                }
            }
        }
        Ok(run)
    }

    /// Requests an authorization for `amount`, rounded to minor units.
    pub async fn authorize(
        &self,
        amount: Decimal,
        metadata: &[(&str, String)],
    ) -> Result<Authorization, MembershipError> {
        let mut request = AuthorizationRequest::new(to_minor_units(amount)?, self.currency.clone());
        for (key, value) in metadata {
            request = request.with_metadata(*key, value);
        }

        self.gateway.authorize(request).await.map_err(|e| {
            tracing::error!(
                code = %e.code,
                provider_code = e.provider_code.as_deref().unwrap_or("-"),
                error = %e.message,
                "payment authorization failed"
            );
            MembershipError::from(e)
        })
    }
}
