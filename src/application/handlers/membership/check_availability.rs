//! CheckAvailabilityHandler - Query handler for time-slot capacity.

use crate::application::LifecycleContext;
use crate::domain::membership::{MembershipError, MembershipStatus, TimeSlot};

/// Query for remaining capacity in a time slot.
#[derive(Debug, Clone)]
pub struct CheckAvailabilityQuery {
    pub time_slot: String,
}

/// Capacity of a time slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAvailabilityResult {
    pub is_available: bool,
    pub remaining_slots: u32,
    pub capacity: u32,
}

/// Handler counting live memberships in a slot against the configured ceiling.
///
/// Active memberships past their end date do not count, even before their
/// expiry has been persisted.
pub struct CheckAvailabilityHandler {
    ctx: LifecycleContext,
}

impl CheckAvailabilityHandler {
    pub fn new(ctx: LifecycleContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(
        &self,
        query: CheckAvailabilityQuery,
    ) -> Result<CheckAvailabilityResult, MembershipError> {
        let slot = TimeSlot::new(query.time_slot)?;
        self.availability(&slot).await
    }

    pub(crate) async fn availability(
        &self,
        slot: &TimeSlot,
    ) -> Result<CheckAvailabilityResult, MembershipError> {
        let now = self.ctx.clock.now();
        let frozen = self
            .ctx
            .store
            .count_by_time_slot(slot, &[MembershipStatus::Frozen])
            .await?;
        // Active rows are loaded so lapsed ones can be skipped by end date.
        let active = self
            .ctx
            .store
            .find_by_time_slot_and_status(slot, &[MembershipStatus::Active])
            .await?
            .iter()
            .filter(|m| m.end_date >= now)
            .count() as u64;

        let occupied = u32::try_from(frozen + active).unwrap_or(u32::MAX);

        let capacity = self.ctx.policy.slot_capacity;
        let remaining_slots = capacity.saturating_sub(occupied);

        Ok(CheckAvailabilityResult {
            is_available: remaining_slots > 0,
            remaining_slots,
            capacity,
        })
    }
}
