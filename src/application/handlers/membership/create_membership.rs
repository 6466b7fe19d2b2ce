//! CreateMembershipHandler - Command handler for purchasing a membership.

use rust_decimal::Decimal;

use crate::application::LifecycleContext;
use crate::domain::foundation::{AccountId, AddonId, PlanId};
use crate::domain::membership::{Membership, MembershipError, NewMembership, TimeSlot};
use crate::domain::pricing::{round_minor, PricingEngine};

use super::CheckAvailabilityHandler;

/// Command to purchase a membership.
#[derive(Debug, Clone)]
pub struct CreateMembershipCommand {
    pub account_id: AccountId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub time_slot: String,
    pub interval: String,
    pub goals: Vec<String>,
}

/// Result of a successful purchase.
#[derive(Debug, Clone)]
pub struct CreateMembershipResult {
    pub membership: Membership,
    /// Amount sent for authorization, rounded to minor units.
    pub charged_amount: Decimal,
    pub payment_client_secret: String,
}

/// Handler for purchasing memberships.
///
/// Payment is authorized before anything is persisted; a gateway failure
/// leaves no record behind. The slot stays locked from the capacity check
/// until the new membership is stored.
pub struct CreateMembershipHandler {
    ctx: LifecycleContext,
}

impl CreateMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id, plan_id = %cmd.plan_id))]
    pub async fn handle(
        &self,
        cmd: CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        let time_slot = TimeSlot::new(cmd.time_slot)?;
        let interval = PricingEngine::parse_interval(&cmd.interval)?;

        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;

        if account.current_membership.is_some() {
            let current = self.ctx.load_current(&mut account).await?;
            if current.is_live() && self.ctx.policy.reject_second_active {
                return Err(MembershipError::AlreadyExists(account.id));
            }
        }

        let selection = self
            .ctx
            .resolve_selection(cmd.plan_id, &cmd.addon_ids)
            .await?;

        let _slot_guard = self.ctx.lock_slot(&time_slot).await;
        let availability = CheckAvailabilityHandler::new(self.ctx.clone())
            .availability(&time_slot)
            .await?;
        if !availability.is_available {
            return Err(MembershipError::validation(
                "time_slot",
                format!("time slot '{}' is full", time_slot),
            ));
        }

        let total = self.ctx.price(&selection, interval).await?;
        let authorization = self
            .ctx
            .authorize(
                total,
                &[
                    ("purpose", "membership_purchase".to_string()),
                    ("account_id", account.id.to_string()),
                    ("plan_id", selection.plan.id.to_string()),
                    ("interval", interval.to_string()),
                ],
            )
            .await?;

        let membership = Membership::purchase(
            NewMembership {
                account_id: account.id,
                plan_id: selection.plan.id,
                addon_ids: selection.addon_ids(),
                interval,
                goals: normalize_goals(cmd.goals),
                time_slot,
                total_price: total,
                payment_reference: authorization.reference,
            },
            self.ctx.clock.now(),
        );

        if let Some(previous) = account.attach(membership.id) {
            tracing::warn!(
                previous_membership_id = %previous,
                "replacing live membership; previous moved to history"
            );
        }
        self.ctx.save_new(&membership, &mut account).await?;

        tracing::info!(
            membership_id = %membership.id,
            total = %membership.total_price,
            end_date = %membership.end_date,
            "membership created"
        );

        Ok(CreateMembershipResult {
            charged_amount: round_minor(total),
            payment_client_secret: authorization.client_secret,
            membership,
        })
    }
}

fn normalize_goals(goals: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(goals.len());
    for goal in goals {
        let goal = goal.trim().to_lowercase();
        if !goal.is_empty() && !out.contains(&goal) {
            out.push(goal);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::membership::test_support::Fixture;
    use crate::domain::catalog::AddonService;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::membership::{LifecyclePolicy, MembershipStatus, PaymentStatus, Resource};
    use crate::ports::{BookingStore, PaymentError};
    use std::time::Duration;

    fn command(fx: &Fixture, interval: &str) -> CreateMembershipCommand {
        CreateMembershipCommand {
            account_id: fx.account,
            plan_id: fx.standard.id,
            addon_ids: vec![fx.sauna.id],
            time_slot: "mon-18:00".into(),
            interval: interval.into(),
            goals: vec!["Strength".into(), " strength ".into(), "".into()],
        }
    }

    #[tokio::test]
    async fn creates_active_pending_membership_with_discounted_total() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(command(&fx, "quarterly")).await.unwrap();

        let m = &result.membership;
        assert_eq!(m.status, MembershipStatus::Active);
        assert_eq!(m.payment_status, PaymentStatus::Pending);
        assert_eq!(m.total_price, Decimal::from(162));
        assert_eq!(m.end_date, fx.start.add_days(90));
        assert_eq!(m.goals, vec!["strength".to_string()]);
        assert!(result.payment_client_secret.contains("secret"));

        let auths = fx.gateway.authorizations();
        assert_eq!(auths.len(), 1);
        assert_eq!(auths[0].amount_minor, 16200);
        assert_eq!(auths[0].currency, "usd");

        let account = fx.store.find_account(&fx.account).await.unwrap().unwrap();
        assert_eq!(account.current_membership, Some(m.id));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_no_record() {
        let fx = Fixture::new().await;
        fx.gateway
            .set_method_error("authorize", PaymentError::card_declined("declined"));
        let handler = CreateMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(command(&fx, "monthly")).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::PaymentFailed);
        assert_eq!(fx.store.membership_count().await, 0);
        let account = fx.store.find_account(&fx.account).await.unwrap().unwrap();
        assert!(account.current_membership.is_none());
    }

    #[tokio::test]
    async fn unknown_interval_is_rejected_before_payment() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(command(&fx, "weekly")).await.unwrap_err();

        assert_eq!(err, MembershipError::InvalidInterval("weekly".into()));
        assert!(!fx.gateway.was_called("authorize"));
    }

    #[tokio::test]
    async fn missing_time_slot_is_validation_error() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        let mut cmd = command(&fx, "monthly");
        cmd.time_slot = "  ".into();

        let err = handler.handle(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn unknown_plan_and_inactive_addon_are_rejected() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());

        let mut cmd = command(&fx, "monthly");
        cmd.plan_id = PlanId::new();
        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            MembershipError::NotFound {
                resource: Resource::Plan,
                ..
            }
        ));

        let retired = AddonService::new("Locker", Decimal::from(5), "amenity").inactive();
        fx.catalog.add_addon(retired.clone()).await;
        let mut cmd = command(&fx, "monthly");
        cmd.addon_ids = vec![retired.id];
        let err = handler.handle(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(!fx.gateway.was_called("authorize"));
    }

    #[tokio::test]
    async fn second_live_purchase_is_rejected_by_default() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        handler.handle(command(&fx, "monthly")).await.unwrap();

        let err = handler.handle(command(&fx, "monthly")).await.unwrap_err();

        assert_eq!(err, MembershipError::AlreadyExists(fx.account));
        assert_eq!(fx.gateway.authorizations().len(), 1);
    }

    #[tokio::test]
    async fn second_purchase_replaces_current_when_allowed() {
        let fx = Fixture::with_policy(LifecyclePolicy {
            reject_second_active: false,
            ..LifecyclePolicy::default()
        })
        .await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        let first = handler.handle(command(&fx, "monthly")).await.unwrap();

        let second = handler.handle(command(&fx, "monthly")).await.unwrap();

        let account = fx.store.find_account(&fx.account).await.unwrap().unwrap();
        assert_eq!(account.current_membership, Some(second.membership.id));
        assert_eq!(account.membership_history, vec![first.membership.id]);
    }

    #[tokio::test]
    async fn purchase_allowed_after_previous_expired() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        let first = handler.handle(command(&fx, "monthly")).await.unwrap();
        fx.clock.advance_days(31);

        let second = handler.handle(command(&fx, "monthly")).await.unwrap();

        let old = fx
            .store
            .find_membership(&first.membership.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.status, MembershipStatus::Expired);
        let account = fx.store.find_account(&fx.account).await.unwrap().unwrap();
        assert_eq!(account.current_membership, Some(second.membership.id));
        assert_eq!(account.membership_history, vec![first.membership.id]);
    }

    #[tokio::test]
    async fn full_slot_rejects_purchase() {
        let fx = Fixture::with_policy(LifecyclePolicy {
            slot_capacity: 1,
            ..LifecyclePolicy::default()
        })
        .await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        handler.handle(command(&fx, "monthly")).await.unwrap();

        let other = fx.add_account().await;
        let mut cmd = command(&fx, "monthly");
        cmd.account_id = other;
        let err = handler.handle(cmd).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(err.message().contains("full"));
    }

    #[tokio::test]
    async fn racing_purchases_fill_last_place_once() {
        let fx = Fixture::with_policy_and_delay(
            LifecyclePolicy {
                slot_capacity: 1,
                ..LifecyclePolicy::default()
            },
            Duration::from_millis(100),
        )
        .await;
        let other = fx.add_account().await;
        let first = CreateMembershipHandler::new(fx.ctx.clone());
        let second = CreateMembershipHandler::new(fx.ctx.clone());
        let mut cmd_other = command(&fx, "monthly");
        cmd_other.account_id = other;

        let (a, b) = tokio::join!(
            first.handle(command(&fx, "monthly")),
            second.handle(cmd_other),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(fx.gateway.authorizations().len(), 1);
        assert_eq!(fx.store.membership_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let fx = Fixture::new().await;
        let handler = CreateMembershipHandler::new(fx.ctx.clone());
        let mut cmd = command(&fx, "monthly");
        cmd.account_id = AccountId::new();

        let err = handler.handle(cmd).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);
    }
}
