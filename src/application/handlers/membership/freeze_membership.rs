//! FreezeMembershipHandler - Command handler for pausing a membership.

use crate::application::LifecycleContext;
use crate::domain::foundation::{AccountId, Timestamp};
use crate::domain::membership::{Membership, MembershipError, MembershipStatus};

/// Command to freeze the account's current membership.
#[derive(Debug, Clone)]
pub struct FreezeMembershipCommand {
    pub account_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct FreezeMembershipResult {
    pub status: MembershipStatus,
    pub freeze_start_date: Timestamp,
    pub membership: Membership,
}

pub struct FreezeMembershipHandler {
    ctx: LifecycleContext,
}

impl FreezeMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        cmd: FreezeMembershipCommand,
    ) -> Result<FreezeMembershipResult, MembershipError> {
        let _guard = self.ctx.lock(cmd.account_id).await;
        let mut account = self.ctx.load_account(cmd.account_id).await?;
        let mut membership = self.ctx.load_current(&mut account).await?;

        let now = self.ctx.clock.now();
        membership.freeze(now)?;
        self.ctx.save(&mut membership, None).await?;

        tracing::info!(
            membership_id = %membership.id,
            from = %MembershipStatus::Active,
            to = %membership.status,
            "membership frozen"
        );

        Ok(FreezeMembershipResult {
            status: membership.status,
            freeze_start_date: now,
            membership,
        })
    }
}
