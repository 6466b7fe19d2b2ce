//! MembershipLifecycleManager - single entry point for lifecycle operations.
//!
//! Wires the ports into a [`LifecycleContext`] once, bounding the gateway by
//! the configured timeout, and dispatches each operation to its handler.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{AccountId, AddonId, PlanId};
use crate::domain::membership::{FreezeStatus, LifecyclePolicy, MembershipError};
use crate::ports::{BookingStore, CatalogReader, Clock, PaymentGateway};

use super::handlers::membership::{
    CancelMembershipCommand, CancelMembershipHandler, CancelMembershipResult,
    CheckAvailabilityHandler, CheckAvailabilityQuery, CheckAvailabilityResult,
    ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult, CreateMembershipCommand,
    CreateMembershipHandler, CreateMembershipResult, EditMembershipCommand, EditMembershipHandler,
    EditMembershipResult, ExtendMembershipCommand, ExtendMembershipHandler,
    ExtendMembershipResult, FreezeMembershipCommand, FreezeMembershipHandler,
    FreezeMembershipResult, GetFreezeStatusHandler, GetFreezeStatusQuery, GetMembershipHandler,
    GetMembershipQuery, GetMembershipResult, UnfreezeMembershipCommand,
    UnfreezeMembershipHandler, UnfreezeMembershipResult,
};
use super::{KeyedLocks, LifecycleContext, TimedPaymentGateway};

/// Tunables for a lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub policy: LifecyclePolicy,
    /// ISO 4217 code sent with every authorization, lowercase.
    pub currency: String,
    /// Upper bound on any single gateway call.
    pub gateway_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            policy: LifecyclePolicy::default(),
            currency: "usd".to_string(),
            gateway_timeout: Duration::from_secs(10),
        }
    }
}

/// Orchestrates membership state transitions and their payments.
///
/// Cheap to clone; clones share the account and slot lock registries.
#[derive(Clone)]
pub struct MembershipLifecycleManager {
    ctx: LifecycleContext,
}

impl MembershipLifecycleManager {
    pub fn new(
        store: Arc<dyn BookingStore>,
        catalog: Arc<dyn CatalogReader>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        settings: LifecycleSettings,
    ) -> Self {
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(TimedPaymentGateway::new(gateway, settings.gateway_timeout));

        Self {
            ctx: LifecycleContext {
                store,
                catalog,
                gateway,
                clock,
                policy: settings.policy,
                currency: settings.currency,
                locks: Arc::new(KeyedLocks::new()),
                slot_locks: Arc::new(KeyedLocks::new()),
            },
        }
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.ctx.policy
    }

    pub async fn create(
        &self,
        cmd: CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        CreateMembershipHandler::new(self.ctx.clone()).handle(cmd).await
    }

    pub async fn freeze(
        &self,
        account_id: AccountId,
    ) -> Result<FreezeMembershipResult, MembershipError> {
        FreezeMembershipHandler::new(self.ctx.clone())
            .handle(FreezeMembershipCommand { account_id })
            .await
    }

    pub async fn unfreeze(
        &self,
        account_id: AccountId,
    ) -> Result<UnfreezeMembershipResult, MembershipError> {
        UnfreezeMembershipHandler::new(self.ctx.clone())
            .handle(UnfreezeMembershipCommand { account_id })
            .await
    }

    pub async fn cancel(
        &self,
        account_id: AccountId,
    ) -> Result<CancelMembershipResult, MembershipError> {
        CancelMembershipHandler::new(self.ctx.clone())
            .handle(CancelMembershipCommand { account_id })
            .await
    }

    pub async fn extend(
        &self,
        account_id: AccountId,
        months: u32,
    ) -> Result<ExtendMembershipResult, MembershipError> {
        ExtendMembershipHandler::new(self.ctx.clone())
            .handle(ExtendMembershipCommand { account_id, months })
            .await
    }

    pub async fn edit(
        &self,
        account_id: AccountId,
        plan_id: PlanId,
        addon_ids: Vec<AddonId>,
    ) -> Result<EditMembershipResult, MembershipError> {
        EditMembershipHandler::new(self.ctx.clone())
            .handle(EditMembershipCommand {
                account_id,
                plan_id,
                addon_ids,
            })
            .await
    }

    pub async fn confirm_payment(
        &self,
        account_id: AccountId,
    ) -> Result<ConfirmPaymentResult, MembershipError> {
        ConfirmPaymentHandler::new(self.ctx.clone())
            .handle(ConfirmPaymentCommand { account_id })
            .await
    }

    pub async fn get_membership(
        &self,
        account_id: AccountId,
    ) -> Result<GetMembershipResult, MembershipError> {
        GetMembershipHandler::new(self.ctx.clone())
            .handle(GetMembershipQuery { account_id })
            .await
    }

    pub async fn get_freeze_status(
        &self,
        account_id: AccountId,
    ) -> Result<FreezeStatus, MembershipError> {
        GetFreezeStatusHandler::new(self.ctx.clone())
            .handle(GetFreezeStatusQuery { account_id })
            .await
    }

    pub async fn check_availability(
        &self,
        time_slot: impl Into<String>,
    ) -> Result<CheckAvailabilityResult, MembershipError> {
        CheckAvailabilityHandler::new(self.ctx.clone())
            .handle(CheckAvailabilityQuery {
                time_slot: time_slot.into(),
            })
            .await
    }
}
