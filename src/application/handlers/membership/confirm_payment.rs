//! ConfirmPaymentHandler - Command handler for finalizing pending charges.
//!
//! Called once the client reports it completed the payment step. Every
//! pending charge is checked; each succeeded intent is settled, and the
//! membership moves to `completed` once none is left pending. Any other
//! gateway status is reported back and leaves that charge untouched.

use crate::application::LifecycleContext;
use crate::domain::foundation::AccountId;
use crate::domain::membership::{Membership, MembershipError, PaymentStatus};
use crate::ports::PaymentIntentStatus;

#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub account_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct ConfirmPaymentResult {
    pub payment_status: PaymentStatus,
    /// `Succeeded` when every pending charge settled, else the first other status seen.
    pub gateway_status: PaymentIntentStatus,
    pub membership: Membership,
}

pub struct ConfirmPaymentHandler {
    ctx: LifecycleContext,
}

impl ConfirmPaymentHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, MembershipError> {
        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;
        membership.ensure_live("confirm payment for")?;

        if membership.payment_status != PaymentStatus::Pending {
            return Err(MembershipError::validation(
                "payment_status",
                format!("payment is already {}", membership.payment_status.as_str()),
            ));
        }
        let pending: Vec<String> = membership
            .pending_payments()
            .map(|p| p.reference.clone())
            .collect();
        if pending.is_empty() {
            return Err(MembershipError::validation(
                "payment_reference",
                "no payment on record to confirm",
            ));
        }

        let mut settled = Vec::new();
        let mut gateway_status = PaymentIntentStatus::Succeeded;
        for reference in pending.iter().rev() {
            let status = self
                .ctx
                .gateway
                .confirm_status(reference)
                .await
                .map_err(|e| {
                    tracing::error!(
                        payment_reference = %reference,
                        code = %e.code,
                        error = %e.message,
                        "payment status lookup failed"
                    );
                    MembershipError::from(e)
                })?;

            if status.is_succeeded() {
                settled.push(reference.as_str());
            } else {
                tracing::info!(
                    membership_id = %membership.id,
                    payment_reference = %reference,
                    gateway_status = ?status,
                    "payment not yet settled"
                );
                if gateway_status.is_succeeded() {
                    gateway_status = status;
                }
            }
        }

        if !settled.is_empty() {
            let now = self.ctx.clock.now();
            for reference in &settled {
                membership.settle_payment(reference, now);
            }
            self.ctx.save(&mut membership, None).await?;
            tracing::info!(
                membership_id = %membership.id,
                settled = settled.len(),
                payment_status = membership.payment_status.as_str(),
                "payments settled"
            );
        }

        Ok(ConfirmPaymentResult {
            payment_status: membership.payment_status,
            gateway_status,
            membership,
        })
    }
}
