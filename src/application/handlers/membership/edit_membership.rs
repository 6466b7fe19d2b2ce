//! EditMembershipHandler - Command handler for changing plan and add-ons.
//!
//! The remaining period is valued under the current and the proposed total,
//! where both cover every extension bought for the period. The difference is
//! charged or refunded across the recorded charges. A failed charge, or a
//! refund that fails before any leg goes through, aborts the edit with
//! nothing persisted. On success the change is applied immediately, ahead of
//! capture.

use rust_decimal::Decimal;

use crate::application::{IssuedRefund, LifecycleContext};
use crate::domain::foundation::{AccountId, AddonId, PlanId};
use crate::domain::membership::{
    allocate_refund, Membership, MembershipError, PaymentPurpose, PlanChange,
};
use crate::domain::pricing::{round_minor, AdjustmentAction, PlanChangeQuote};

/// Command to change the current membership's plan and add-ons.
#[derive(Debug, Clone)]
pub struct EditMembershipCommand {
    pub account_id: AccountId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
}

/// Refund issued for a downgrade, one entry per charge it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRefund {
    pub amount: Decimal,
    pub refunds: Vec<IssuedRefund>,
}

#[derive(Debug, Clone)]
pub struct EditMembershipResult {
    pub membership: Membership,
    /// Money movement, amounts rounded to minor units.
    pub adjustment: AdjustmentAction,
    pub payment_required: bool,
    pub payment_client_secret: Option<String>,
    pub refund: Option<EditRefund>,
}

pub struct EditMembershipHandler {
    ctx: LifecycleContext,
}

impl EditMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id, plan_id = %cmd.plan_id))]
    pub async fn handle(
        &self,
        cmd: EditMembershipCommand,
    ) -> Result<EditMembershipResult, MembershipError> {
        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;
        membership.ensure_live("edit")?;

        let selection = self
            .ctx
            .resolve_selection(cmd.plan_id, &cmd.addon_ids)
            .await?;
        let new_total = self.ctx.price_period(&selection, &membership).await?;

        let now = self.ctx.clock.now();
        let quote = PlanChangeQuote::compute(
            membership.period_position(now),
            membership.total_price,
            new_total,
            self.ctx.policy.edit_epsilon,
        );

        let mut result = EditMembershipResult {
            membership: membership.clone(),
            adjustment: AdjustmentAction::None,
            payment_required: false,
            payment_client_secret: None,
            refund: None,
        };
        let mut charge = None;

        match quote.action {
            AdjustmentAction::Charge(difference) => {
                let authorization = self
                    .ctx
                    .authorize(
                        difference,
                        &[
                            ("purpose", "membership_upgrade".to_string()),
                            ("account_id", account.id.to_string()),
                            ("membership_id", membership.id.to_string()),
                        ],
                    )
                    .await?;
                let amount = round_minor(difference);
                result.adjustment = AdjustmentAction::Charge(amount);
                result.payment_required = true;
                result.payment_client_secret = Some(authorization.client_secret);
                charge = Some((authorization.reference, amount));
            }
            AdjustmentAction::Refund(difference) => {
                let amount = round_minor(difference);
                let refunds = self.refund(&mut membership, amount).await?;
                result.adjustment = AdjustmentAction::Refund(amount);
                result.refund = Some(EditRefund { amount, refunds });
            }
            AdjustmentAction::None => {}
        }

        membership.change_plan(
            PlanChange {
                plan_id: selection.plan.id,
                addon_ids: selection.addon_ids(),
                total_price: new_total,
            },
            now,
        )?;
        if let Some((reference, amount)) = charge {
            membership.record_charge(reference, amount, PaymentPurpose::Upgrade, now);
        }
        self.ctx.save(&mut membership, None).await?;

        tracing::info!(
            membership_id = %membership.id,
            plan_id = %membership.plan_id,
            total = %membership.total_price,
            difference = %quote.difference(),
            "membership edited"
        );

        result.membership = membership;
        Ok(result)
    }

    /// Refunds `amount` across the ledger and books every accepted leg.
    ///
    /// When a later leg fails, the legs already issued are persisted before
    /// the error is returned so the ledger matches the gateway.
    async fn refund(
        &self,
        membership: &mut Membership,
        amount: Decimal,
    ) -> Result<Vec<IssuedRefund>, MembershipError> {
        let plan = allocate_refund(&membership.payments, amount);
        if plan.legs.is_empty() || plan.unallocated > Decimal::ZERO {
            return Err(MembershipError::validation(
                "payments",
                format!("refund of {} exceeds the charges on record", amount),
            ));
        }

        let run = self.ctx.refund_legs(&plan.legs).await?;
        let now = self.ctx.clock.now();
        for leg in &run.issued {
            membership.record_refund(&leg.payment_reference, leg.amount, now);
        }

        match run.failure {
            None => Ok(run.issued),
            Some(e) => {
                tracing::error!(
                    membership_id = %membership.id,
                    issued = run.issued.len(),
                    code = %e.code,
                    "downgrade refund failed"
                );
                if !run.issued.is_empty() {
                    self.ctx.save(membership, None).await?;
                }
                Err(MembershipError::from(e))
            }
        }
    }
}
