//! CancelMembershipHandler - Command handler for cancelling memberships.
//!
//! The cancellation is persisted before any money moves. Refund failures do
//! not undo it: they are reported in `warnings` for operator follow-up.

use rust_decimal::Decimal;

use crate::application::{IssuedRefund, LifecycleContext};
use crate::domain::foundation::AccountId;
use crate::domain::membership::{allocate_refund, Membership, MembershipError, RefundPlan};
use crate::domain::pricing::{cancellation_refund, round_minor};
use crate::ports::RefundStatus;

/// Command to cancel the account's current membership.
#[derive(Debug, Clone)]
pub struct CancelMembershipCommand {
    pub account_id: AccountId,
}

/// What happened to the refund leg of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    /// Gateway accepted a refund on every charge it was split across.
    Issued(Vec<IssuedRefund>),
    /// Nothing left to refund.
    NotRequired,
    /// No charge on record to refund against.
    Skipped,
    /// A gateway call failed; `issued` holds the legs that went through before it.
    Failed {
        issued: Vec<IssuedRefund>,
        reason: String,
    },
}

impl RefundOutcome {
    pub fn status_label(&self) -> &'static str {
        match self {
            RefundOutcome::Issued(legs) => legs
                .iter()
                .find(|leg| leg.status != RefundStatus::Succeeded)
                .map(|leg| leg.status.as_str())
                .unwrap_or("succeeded"),
            RefundOutcome::NotRequired => "not_required",
            RefundOutcome::Skipped => "skipped",
            RefundOutcome::Failed { .. } => "failed",
        }
    }

    /// Refunds the gateway accepted.
    pub fn issued(&self) -> &[IssuedRefund] {
        match self {
            RefundOutcome::Issued(legs) | RefundOutcome::Failed { issued: legs, .. } => legs,
            RefundOutcome::NotRequired | RefundOutcome::Skipped => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CancelMembershipResult {
    pub membership: Membership,
    /// Refund owed, rounded to minor units.
    pub refund_amount: Decimal,
    pub refund: RefundOutcome,
    pub warnings: Vec<String>,
}

/// Handler for cancelling memberships.
///
/// Refunds the full price within the first `full_refund_window_days`,
/// otherwise the prorated remainder. The amount is split across the
/// recorded charges newest first.
pub struct CancelMembershipHandler {
    ctx: LifecycleContext,
}

impl CancelMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        cmd: CancelMembershipCommand,
    ) -> Result<CancelMembershipResult, MembershipError> {
        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;

        let now = self.ctx.clock.now();
        let from = membership.status;
        let owed = cancellation_refund(
            membership.total_price,
            membership.period_position(now),
            self.ctx.policy.full_refund_window_days,
        );
        let refund_amount = round_minor(owed);
        let plan = allocate_refund(&membership.payments, refund_amount);

        membership.cancel(now)?;
        account.release(membership.id);
        self.ctx.save(&mut membership, Some(&mut account)).await?;

        let mut warnings = Vec::new();
        let refund = self
            .refund(&membership, refund_amount, &plan, &mut warnings)
            .await?;

        for leg in refund.issued() {
            membership.record_refund(&leg.payment_reference, leg.amount, now);
        }
        if let RefundOutcome::Issued(legs) = &refund {
            if legs
                .iter()
                .all(|leg| matches!(leg.status, RefundStatus::Pending | RefundStatus::Succeeded))
            {
                membership.mark_refunded(now);
            }
        }
        if !refund.issued().is_empty() {
            if let Err(e) = self.ctx.save(&mut membership, None).await {
                let references = refund
                    .issued()
                    .iter()
                    .map(|leg| leg.refund_reference.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::error!(
                    membership_id = %membership.id,
                    refund_references = %references,
                    error = %e,
                    "refund issued but not recorded"
                );
                warnings.push(format!(
                    "Refunds {} were issued but could not be recorded; reconcile manually",
                    references
                ));
            }
        }

        tracing::info!(
            membership_id = %membership.id,
            from = %from,
            to = %membership.status,
            refund_amount = %refund_amount,
            refund_status = refund.status_label(),
            "membership cancelled"
        );

        Ok(CancelMembershipResult {
            membership,
            refund_amount,
            refund,
            warnings,
        })
    }

    async fn refund(
        &self,
        membership: &Membership,
        amount: Decimal,
        plan: &RefundPlan,
        warnings: &mut Vec<String>,
    ) -> Result<RefundOutcome, MembershipError> {
        if amount <= Decimal::ZERO {
            return Ok(RefundOutcome::NotRequired);
        }

        if plan.legs.is_empty() {
            tracing::warn!(
                membership_id = %membership.id,
                "no charge on record; refund skipped"
            );
            warnings.push(format!(
                "Refund of {} skipped: no charge on record to refund against",
                amount
            ));
            return Ok(RefundOutcome::Skipped);
        }

        if plan.unallocated > Decimal::ZERO {
            tracing::warn!(
                membership_id = %membership.id,
                unallocated = %plan.unallocated,
                "refund exceeds recorded charges"
            );
            warnings.push(format!(
                "{} of the refund exceeds the recorded charges; manual follow-up required",
                plan.unallocated
            ));
        }

        let run = self.ctx.refund_legs(&plan.legs).await?;

        for leg in &run.issued {
            if matches!(leg.status, RefundStatus::Failed | RefundStatus::Canceled) {
                tracing::warn!(
                    membership_id = %membership.id,
                    refund_reference = %leg.refund_reference,
                    status = leg.status.as_str(),
                    "gateway reported refund not completed"
                );
                warnings.push(format!(
                    "Refund {} was not completed by the payment provider; manual follow-up required",
                    leg.refund_reference
                ));
            }
        }

        match run.failure {
            None => Ok(RefundOutcome::Issued(run.issued)),
            Some(e) => {
                let issued: Decimal = run.issued.iter().map(|leg| leg.amount).sum();
                tracing::warn!(
                    membership_id = %membership.id,
                    code = %e.code,
                    "refund failed; cancellation stands"
                );
                warnings.push(format!(
                    "Refund of {} failed ({}); manual follow-up required",
                    amount - issued,
                    e.code
                ));
                Ok(RefundOutcome::Failed {
                    issued: run.issued,
                    reason: e.message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::membership::test_support::Fixture;
    use crate::application::handlers::membership::{
        ExtendMembershipCommand, ExtendMembershipHandler,
    };
    use crate::domain::foundation::ErrorCode;
    use crate::domain::membership::{MembershipStatus, PaymentStatus};
    use crate::ports::{BookingStore, PaymentError};
    use std::time::Duration;

    fn cmd(fx: &Fixture) -> CancelMembershipCommand {
        CancelMembershipCommand {
            account_id: fx.account,
        }
    }

    #[tokio::test]
    async fn cancel_within_first_week_refunds_in_full() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.clock.advance_days(5);
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund_amount, m.total_price);
        assert_eq!(result.membership.status, MembershipStatus::Cancelled);
        assert_eq!(result.membership.payment_status, PaymentStatus::Refunded);
        assert!(result.warnings.is_empty());
        let refunds = fx.gateway.refunds();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].amount_minor, 5000);
        assert_eq!(Some(refunds[0].reference.clone()), m.payment_reference);
    }

    #[tokio::test]
    async fn cancel_on_day_ten_refunds_prorated_remainder() {
        let fx = Fixture::new().await;
        fx.seed_membership(Decimal::from(90), 30).await;
        fx.clock.advance_days(10);
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund_amount, Decimal::from(60));
        assert_eq!(fx.gateway.refunds()[0].amount_minor, 6000);
    }

    #[tokio::test]
    async fn refund_failure_is_recovered() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.gateway
            .set_method_error("refund", PaymentError::network("connection reset"));
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert!(matches!(result.refund, RefundOutcome::Failed { .. }));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.membership.status, MembershipStatus::Cancelled);
        assert_eq!(result.membership.payment_status, PaymentStatus::Pending);

        let account = fx.store.find_account(&fx.account).await.unwrap().unwrap();
        assert!(account.current_membership.is_none());
        assert_eq!(account.membership_history, vec![m.id]);
        assert_eq!(fx.membership(m.id).await.status, MembershipStatus::Cancelled);
    }

    #[tokio::test]
    async fn refund_timeout_is_recovered() {
        let fx = Fixture::with_gateway_delay(Duration::from_millis(200), Duration::from_millis(20))
            .await;
        fx.seed_membership(Decimal::from(90), 30).await;
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund.status_label(), "failed");
        assert!(result.warnings[0].contains("timeout"));
        assert_eq!(result.membership.status, MembershipStatus::Cancelled);
    }

    #[tokio::test]
    async fn empty_payment_ledger_skips_refund_with_warning() {
        let fx = Fixture::new().await;
        let mut m = fx.seed_membership(Decimal::from(90), 30).await;
        m.payments.clear();
        fx.store.update_membership(&m).await.unwrap();
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund, RefundOutcome::Skipped);
        assert_eq!(result.warnings.len(), 1);
        assert!(!fx.gateway.was_called("refund"));
        assert_eq!(result.membership.status, MembershipStatus::Cancelled);
    }

    #[tokio::test]
    async fn nothing_left_means_no_refund_call() {
        let fx = Fixture::new().await;
        fx.seed_membership(Decimal::from(90), 30).await;
        fx.freeze().await;
        fx.clock.advance_days(45);
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund, RefundOutcome::NotRequired);
        assert_eq!(result.refund_amount, Decimal::ZERO);
        assert!(!fx.gateway.was_called("refund"));
        assert_eq!(result.membership.freeze_history.len(), 1);
    }

    #[tokio::test]
    async fn refund_is_split_across_purchase_and_extension_charges() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        ExtendMembershipHandler::new(fx.ctx.clone())
            .handle(ExtendMembershipCommand {
                account_id: fx.account,
                months: 1,
            })
            .await
            .unwrap();
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.refund_amount, Decimal::from(100));
        let refunds = fx.gateway.refunds();
        assert_eq!(refunds.len(), 2);
        assert_eq!(refunds[0].reference, "pi_mock_2");
        assert_eq!(refunds[0].amount_minor, 5000);
        assert_eq!(Some(refunds[1].reference.clone()), m.payment_reference);
        assert_eq!(refunds[1].amount_minor, 5000);
        assert_eq!(result.refund.issued().len(), 2);
        assert_eq!(result.refund.status_label(), "succeeded");

        let stored = fx.membership(m.id).await;
        assert_eq!(stored.payment_status, PaymentStatus::Refunded);
        assert!(stored.payments.iter().all(|p| p.refundable().is_zero()));
    }

    #[tokio::test]
    async fn failed_second_leg_keeps_the_first_and_warns() {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        ExtendMembershipHandler::new(fx.ctx.clone())
            .handle(ExtendMembershipCommand {
                account_id: fx.account,
                months: 1,
            })
            .await
            .unwrap();
        fx.gateway.set_reference_error(
            m.payment_reference.as_deref().unwrap(),
            PaymentError::network("connection reset"),
        );
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert!(matches!(result.refund, RefundOutcome::Failed { .. }));
        assert_eq!(result.refund.issued().len(), 1);
        assert!(result.warnings[0].contains("50"));
        let stored = fx.membership(m.id).await;
        assert_eq!(stored.status, MembershipStatus::Cancelled);
        assert_eq!(stored.payments[1].refunded, Decimal::from(50));
        assert_eq!(stored.payments[0].refunded, Decimal::ZERO);
        assert_ne!(stored.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn refund_is_not_sent_when_cancellation_cannot_be_saved() {
        let mut fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.limit_commits(0);
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(cmd(&fx)).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(!fx.gateway.was_called("refund"));
        assert_eq!(fx.membership(m.id).await.status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn unrecorded_refund_is_reported_not_failed() {
        let mut fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.limit_commits(1);
        let handler = CancelMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(fx.gateway.refunds().len(), 1);
        let refund_reference = &result.refund.issued()[0].refund_reference;
        assert!(result.warnings[0].contains(refund_reference.as_str()));
        let stored = fx.membership(m.id).await;
        assert_eq!(stored.status, MembershipStatus::Cancelled);
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn cancelled_membership_cannot_be_cancelled_again() {
        let fx = Fixture::new().await;
        fx.purchase().await;
        let handler = CancelMembershipHandler::new(fx.ctx.clone());
        handler.handle(cmd(&fx)).await.unwrap();

        let err = handler.handle(cmd(&fx)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MembershipNotFound);
    }
}
