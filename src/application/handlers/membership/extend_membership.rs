//! ExtendMembershipHandler - Command handler for buying more time.
//!
//! The new end date and total are applied as soon as the authorization
//! request succeeds, before capture is confirmed. Payment status returns to
//! pending until `ConfirmPaymentHandler` sees the charge settle.

use rust_decimal::Decimal;

use crate::application::LifecycleContext;
use crate::domain::catalog::{select_discount, BillingInterval};
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{Membership, MembershipError, Resource};
use crate::domain::pricing::{round_minor, PricingEngine};

/// Command to extend the current membership by a number of months.
#[derive(Debug, Clone)]
pub struct ExtendMembershipCommand {
    pub account_id: AccountId,
    pub months: u32,
}

#[derive(Debug, Clone)]
pub struct ExtendMembershipResult {
    /// Incremental cost, rounded to minor units.
    pub extension_cost: Decimal,
    pub interval: BillingInterval,
    pub new_end_date: Timestamp,
    pub payment_client_secret: String,
    pub membership: Membership,
}

pub struct ExtendMembershipHandler {
    ctx: LifecycleContext,
}

impl ExtendMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        cmd: ExtendMembershipCommand,
    ) -> Result<ExtendMembershipResult, MembershipError> {
        let interval = PricingEngine::extension_interval(cmd.months)?;

        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;
        membership.ensure_live("extend")?;

        let plan = self
            .ctx
            .catalog
            .find_plan(&membership.plan_id)
            .await?
            .ok_or_else(|| MembershipError::not_found(Resource::Plan, membership.plan_id))?;
        let discounts = self.ctx.catalog.discounts_for(interval).await?;
        let (_, cost) =
            PricingEngine::extension_cost(&plan, cmd.months, select_discount(&discounts, interval))?;

        let authorization = self
            .ctx
            .authorize(
                cost,
                &[
                    ("purpose", "membership_extension".to_string()),
                    ("account_id", account.id.to_string()),
                    ("membership_id", membership.id.to_string()),
                    ("months", cmd.months.to_string()),
                ],
            )
            .await?;

        let new_end_date = membership.apply_extension(
            interval,
            cost,
            authorization.reference,
            self.ctx.clock.now(),
        )?;
        self.ctx.save(&mut membership, None).await?;

        tracing::info!(
            membership_id = %membership.id,
            months = cmd.months,
            cost = %cost,
            new_end_date = %new_end_date,
            "membership extended"
        );

        Ok(ExtendMembershipResult {
            extension_cost: round_minor(cost),
            interval,
            new_end_date,
            payment_client_secret: authorization.client_secret,
            membership,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::membership::test_support::Fixture;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::membership::{MembershipStatus, PaymentStatus};
    use crate::ports::PaymentError;

    fn cmd(fx: &Fixture, months: u32) -> ExtendMembershipCommand {
        ExtendMembershipCommand {
            account_id: fx.account,
            months,
        }
    }

    #[tokio::test]
    async fn quarter_extension_uses_base_price_and_matching_discount() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        let handler = ExtendMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx, 3)).await.unwrap();

        // 50 × 3 × 0.9
        assert_eq!(result.extension_cost, Decimal::from(135));
        assert_eq!(result.interval, BillingInterval::Quarterly);
        assert_eq!(result.new_end_date, m.end_date.add_days(90));
        assert_eq!(result.membership.total_price, m.total_price + Decimal::from(135));
        assert_eq!(result.membership.payment_status, PaymentStatus::Pending);
        assert_ne!(result.membership.payment_reference, m.payment_reference);
        assert_eq!(fx.gateway.authorizations()[1].amount_minor, 13500);
    }

    #[tokio::test]
    async fn unsupported_month_count_is_rejected() {
        let fx = Fixture::new().await;
        fx.purchase().await;
        let handler = ExtendMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(cmd(&fx, 6)).await.unwrap_err();

        assert_eq!(err, MembershipError::UnsupportedExtension(6));
        assert_eq!(fx.gateway.call_count("authorize"), 1);
    }

    #[tokio::test]
    async fn payment_failure_leaves_membership_unchanged() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.gateway
            .set_method_error("authorize", PaymentError::card_declined("declined"));
        let handler = ExtendMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(cmd(&fx, 1)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::PaymentFailed);
        let stored = fx.membership(m.id).await;
        assert_eq!(stored.end_date, m.end_date);
        assert_eq!(stored.total_price, m.total_price);
        assert_eq!(stored.version, m.version);
    }

    #[tokio::test]
    async fn frozen_membership_can_be_extended() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.freeze().await;
        let handler = ExtendMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx, 1)).await.unwrap();

        assert_eq!(result.membership.status, MembershipStatus::Frozen);
        assert_eq!(result.new_end_date, m.end_date.add_days(30));
        assert_eq!(result.extension_cost, Decimal::from(50));
    }
}
