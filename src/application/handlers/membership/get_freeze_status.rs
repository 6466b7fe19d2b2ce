//! GetFreezeStatusHandler - Query handler for the freeze projection.

use crate::application::LifecycleContext;
use crate::domain::foundation::AccountId;
use crate::domain::membership::{FreezeStatus, MembershipError};

#[derive(Debug, Clone)]
pub struct GetFreezeStatusQuery {
    pub account_id: AccountId,
}

/// Handler for reading the freeze state of the current membership.
///
/// Takes the account lock because a lapsed membership is expired and
/// persisted on read.
pub struct GetFreezeStatusHandler {
    ctx: LifecycleContext,
}

impl GetFreezeStatusHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, query: GetFreezeStatusQuery) -> Result<FreezeStatus, MembershipError> {
        let _guard = self.ctx.lock(query.account_id).await;
        let mut account = self.ctx.load_account(query.account_id).await?;
        let membership = self.ctx.load_current(&mut account).await?;

        Ok(membership.freeze_status(self.ctx.clock.now(), &self.ctx.policy))
    }
}
