//! GetMembershipHandler - Query handler for the current membership.

use crate::application::LifecycleContext;
use crate::domain::foundation::AccountId;
use crate::domain::membership::{Membership, MembershipError};

/// Query to get an account's current membership.
#[derive(Debug, Clone)]
pub struct GetMembershipQuery {
    pub account_id: AccountId,
}

#[derive(Debug, Clone)]
pub struct GetMembershipResult {
    /// The current membership, or the one that just lapsed on this read.
    pub membership: Membership,
    /// Earlier memberships, oldest first.
    pub history: Vec<Membership>,
}

/// Handler for retrieving membership details.
///
/// Fails with `NotFound` when the account has no current membership.
pub struct GetMembershipHandler {
    ctx: LifecycleContext,
}

impl GetMembershipHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    pub async fn handle(
        &self,
        query: GetMembershipQuery,
    ) -> Result<GetMembershipResult, MembershipError> {
        let _guard = self.ctx.lock(query.account_id).await;
        let mut account = self.ctx.load_account(query.account_id).await?;
        let membership = self.ctx.load_current(&mut account).await?;

        let mut history: Vec<Membership> = self
            .ctx
            .store
            .find_by_account(&account.id)
            .await?
            .into_iter()
            .filter(|m| m.id != membership.id)
            .collect();
        history.sort_by_key(|m| m.created_at);

        Ok(GetMembershipResult {
            membership,
            history,
        })
    }
}
