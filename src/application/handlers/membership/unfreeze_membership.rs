//! UnfreezeMembershipHandler - Command handler for resuming a frozen membership.

use crate::application::LifecycleContext;
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{Membership, MembershipError, MembershipStatus};

/// Command to unfreeze the account's current membership.
#[derive(Debug, Clone)]
pub struct UnfreezeMembershipCommand {
    pub account_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct UnfreezeMembershipResult {
    pub status: MembershipStatus,
    pub new_end_date: Timestamp,
    /// Days credited to the end date.
    pub extension_days: i64,
    pub freeze_duration_days: i64,
    pub membership: Membership,
}

/// Handler for ending a freeze.
///
/// The freeze must have lasted `min_freeze_days`; the credit per episode is
/// capped at `max_freeze_credit_days`.
pub struct UnfreezeMembershipHandler {
    ctx: LifecycleContext,
}

impl UnfreezeMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        cmd: UnfreezeMembershipCommand,
    ) -> Result<UnfreezeMembershipResult, MembershipError> {
        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;

        let outcome = membership.unfreeze(self.ctx.clock.now(), &self.ctx.policy)?;
        self.ctx.save(&mut membership, None).await?;

        tracing::info!(
            membership_id = %membership.id,
            from = %MembershipStatus::Frozen,
            to = %membership.status,
            freeze_days = outcome.duration_days,
            credited_days = outcome.extension_days,
            "membership unfrozen"
        );

        Ok(UnfreezeMembershipResult {
            status: membership.status,
            new_end_date: outcome.new_end_date,
            extension_days: outcome.extension_days,
            freeze_duration_days: outcome.duration_days,
            membership,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::membership::test_support::Fixture;

    async fn frozen_fixture() -> (Fixture, Membership) {
        let fx = Fixture::new().await;
        let m = fx.purchase().await;
        fx.freeze().await;
        (fx, m)
    }

    fn cmd(fx: &Fixture) -> UnfreezeMembershipCommand {
        UnfreezeMembershipCommand {
            account_id: fx.account,
        }
    }

    #[tokio::test]
    async fn five_day_freeze_is_too_short() {
        let (fx, m) = frozen_fixture().await;
        fx.clock.advance_days(5);
        let handler = UnfreezeMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(cmd(&fx)).await.unwrap_err();

        assert_eq!(err, MembershipError::FreezeTooShort { days: 5, minimum: 7 });
        assert_eq!(fx.membership(m.id).await.status, MembershipStatus::Frozen);
    }

    #[tokio::test]
    async fn ten_day_freeze_extends_by_ten() {
        let (fx, m) = frozen_fixture().await;
        fx.clock.advance_days(10);
        let handler = UnfreezeMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.status, MembershipStatus::Active);
        assert_eq!(result.extension_days, 10);
        assert_eq!(result.new_end_date, m.end_date.add_days(10));
        let stored = fx.membership(m.id).await;
        assert_eq!(stored.freeze_history.len(), 1);
        assert_eq!(stored.freeze_history[0].duration_days, 10);
        assert!(stored.freeze_start_date.is_none());
    }

    #[tokio::test]
    async fn sixty_day_freeze_is_capped_at_fifty() {
        let (fx, m) = frozen_fixture().await;
        fx.clock.advance_days(60);
        let handler = UnfreezeMembershipHandler::new(fx.ctx.clone());

        let result = handler.handle(cmd(&fx)).await.unwrap();

        assert_eq!(result.freeze_duration_days, 60);
        assert_eq!(result.extension_days, 50);
        assert_eq!(result.new_end_date, m.end_date.add_days(50));
    }

    #[tokio::test]
    async fn unfreezing_active_membership_is_invalid_transition() {
        let fx = Fixture::new().await;
        fx.purchase().await;
        let handler = UnfreezeMembershipHandler::new(fx.ctx.clone());

        let err = handler.handle(cmd(&fx)).await.unwrap_err();
        assert_eq!(
            err,
            MembershipError::invalid_transition(MembershipStatus::Active, "unfreeze")
        );
    }
}
