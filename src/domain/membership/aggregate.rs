//! Membership aggregate entity.
//!
//! A membership is one purchased subscription. Every mutation takes the
//! current instant explicitly so the lifecycle rules stay deterministic.
//!
//! # Design Decisions
//!
//! - **Exact money**: totals are `Decimal`, rounded only at the gateway
//! - **Whole days**: freeze durations and credits are floored to days
//! - **Lazy expiry**: `refresh_expiry` is applied whenever a membership is loaded
//! - **Per-charge ledger**: every authorization stays in `payments`; refunds
//!   are booked against the charge they return money from

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::BillingInterval;
use crate::domain::foundation::{AccountId, AddonId, MembershipId, PlanId, StateMachine, Timestamp};
use crate::domain::pricing::{round_minor, PeriodPosition};

use super::{
    FreezeRecord, FreezeStatus, LifecyclePolicy, MembershipError, MembershipStatus,
    PaymentPurpose, PaymentRecord, PaymentStatus, TimeSlot, UnfreezeOutcome,
};

/// Purchase details for a new membership.
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub account_id: AccountId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub interval: BillingInterval,
    pub goals: Vec<String>,
    pub time_slot: TimeSlot,
    pub total_price: Decimal,
    pub payment_reference: String,
}

/// Replacement configuration for an edit.
#[derive(Debug, Clone)]
pub struct PlanChange {
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub total_price: Decimal,
}

/// Membership aggregate.
///
/// # Invariants
///
/// - `end_date >= start_date`
/// - `freeze_start_date.is_some()` iff `status == Frozen`
/// - `freeze_history` is append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub account_id: AccountId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub interval: BillingInterval,
    pub goals: Vec<String>,
    pub time_slot: TimeSlot,
    pub total_price: Decimal,

    /// Gateway reference of the latest authorization.
    pub payment_reference: Option<String>,
    pub payment_status: PaymentStatus,
    /// Every authorization taken, oldest first.
    pub payments: Vec<PaymentRecord>,

    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub status: MembershipStatus,

    pub freeze_start_date: Option<Timestamp>,
    pub freeze_history: Vec<FreezeRecord>,

    /// Optimistic concurrency counter, bumped by the store on every update.
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Membership {
    /// Creates an Active membership starting at `now`.
    ///
    /// The end date is `now` plus the interval's day count; payment is pending.
    pub fn purchase(new: NewMembership, now: Timestamp) -> Self {
        let charge = PaymentRecord::pending(
            new.payment_reference.clone(),
            round_minor(new.total_price),
            PaymentPurpose::Purchase,
            now,
        );
        Self {
            id: MembershipId::new(),
            account_id: new.account_id,
            plan_id: new.plan_id,
            addon_ids: new.addon_ids,
            interval: new.interval,
            goals: new.goals,
            time_slot: new.time_slot,
            total_price: new.total_price,
            payment_reference: Some(new.payment_reference),
            payment_status: PaymentStatus::Pending,
            payments: vec![charge],
            start_date: now,
            end_date: now.add_days(new.interval.days()),
            status: MembershipStatus::Active,
            freeze_start_date: None,
            freeze_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Expires an Active membership whose end date has passed.
    ///
    /// Returns true when the status changed. Frozen memberships never expire.
    pub fn refresh_expiry(&mut self, now: Timestamp) -> bool {
        if self.status == MembershipStatus::Active && self.end_date < now {
            self.status = MembershipStatus::Expired;
            self.updated_at = now;
            return true;
        }
        false
    }

    /// Pauses an Active membership.
    pub fn freeze(&mut self, now: Timestamp) -> Result<(), MembershipError> {
        self.transition(MembershipStatus::Frozen, "freeze")?;
        self.freeze_start_date = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Resumes a Frozen membership and credits its end date.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` unless Frozen
    /// - `FreezeTooShort` if the freeze lasted less than `policy.min_freeze_days`
    pub fn unfreeze(
        &mut self,
        now: Timestamp,
        policy: &LifecyclePolicy,
    ) -> Result<UnfreezeOutcome, MembershipError> {
        let started = match (self.status, self.freeze_start_date) {
            (MembershipStatus::Frozen, Some(started)) => started,
            _ => return Err(MembershipError::invalid_transition(self.status, "unfreeze")),
        };

        let duration_days = now.days_since(&started);
        if duration_days < policy.min_freeze_days {
            return Err(MembershipError::FreezeTooShort {
                days: duration_days,
                minimum: policy.min_freeze_days,
            });
        }

        let extension_days = policy.freeze_credit(duration_days);
        self.transition(MembershipStatus::Active, "unfreeze")?;
        self.end_date = self.end_date.add_days(extension_days);
        self.freeze_history.push(FreezeRecord {
            start: started,
            end: now,
            duration_days,
        });
        self.freeze_start_date = None;
        self.updated_at = now;

        Ok(UnfreezeOutcome {
            duration_days,
            extension_days,
            new_end_date: self.end_date,
        })
    }

    /// Cancels an Active or Frozen membership.
    ///
    /// An open freeze episode is closed into the history without credit.
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), MembershipError> {
        self.transition(MembershipStatus::Cancelled, "cancel")?;
        if let Some(started) = self.freeze_start_date.take() {
            self.freeze_history.push(FreezeRecord {
                start: started,
                end: now,
                duration_days: now.days_since(&started),
            });
        }
        self.updated_at = now;
        Ok(())
    }

    /// Fails with `InvalidTransition` unless the membership is Active or Frozen.
    pub fn ensure_live(&self, attempted: &'static str) -> Result<(), MembershipError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(MembershipError::invalid_transition(self.status, attempted))
        }
    }

    /// Applies an authorized extension: later end date, larger total.
    ///
    /// The authorization joins the ledger as the latest charge and payment
    /// returns to pending until confirmed.
    pub fn apply_extension(
        &mut self,
        interval: BillingInterval,
        cost: Decimal,
        authorization_reference: String,
        now: Timestamp,
    ) -> Result<Timestamp, MembershipError> {
        self.ensure_live("extend")?;
        self.end_date = self.end_date.add_days(interval.days());
        self.total_price += cost;
        self.record_charge(
            authorization_reference,
            round_minor(cost),
            PaymentPurpose::Extension {
                months: interval.multiplier(),
            },
            now,
        );
        Ok(self.end_date)
    }

    /// Replaces plan, add-ons and total.
    ///
    /// Any charge for the change is booked separately with `record_charge`.
    pub fn change_plan(&mut self, change: PlanChange, now: Timestamp) -> Result<(), MembershipError> {
        self.ensure_live("edit")?;
        self.plan_id = change.plan_id;
        self.addon_ids = change.addon_ids;
        self.total_price = change.total_price;
        self.updated_at = now;
        Ok(())
    }

    /// Appends an authorization to the ledger and makes it the latest reference.
    pub fn record_charge(
        &mut self,
        reference: String,
        amount: Decimal,
        purpose: PaymentPurpose,
        now: Timestamp,
    ) {
        self.payments
            .push(PaymentRecord::pending(reference.clone(), amount, purpose, now));
        self.payment_reference = Some(reference);
        self.payment_status = PaymentStatus::Pending;
        self.updated_at = now;
    }

    /// Books a refund against the charge it was issued on.
    ///
    /// A charge refunded in full is marked Refunded. Unknown references are ignored.
    pub fn record_refund(&mut self, reference: &str, amount: Decimal, now: Timestamp) {
        if let Some(record) = self.payments.iter_mut().find(|p| p.reference == reference) {
            record.refunded += amount;
            if record.refundable().is_zero() {
                record.status = PaymentStatus::Refunded;
            }
            self.updated_at = now;
        }
    }

    /// Charges still awaiting gateway confirmation.
    pub fn pending_payments(&self) -> impl Iterator<Item = &PaymentRecord> {
        self.payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
    }

    /// Month counts of every extension bought in the current period.
    pub fn extension_months(&self) -> impl Iterator<Item = u32> + '_ {
        self.payments.iter().filter_map(|p| match p.purpose {
            PaymentPurpose::Extension { months } => Some(months),
            _ => None,
        })
    }

    /// Marks one pending charge settled.
    ///
    /// The membership's payment status turns Completed once nothing is pending.
    pub fn settle_payment(&mut self, reference: &str, now: Timestamp) {
        if let Some(record) = self
            .payments
            .iter_mut()
            .find(|p| p.reference == reference && p.status == PaymentStatus::Pending)
        {
            record.status = PaymentStatus::Completed;
        }
        if self.pending_payments().next().is_none() {
            self.payment_status = PaymentStatus::Completed;
        }
        self.updated_at = now;
    }

    /// Settles every pending charge.
    pub fn mark_payment_completed(&mut self, now: Timestamp) {
        for record in self.payments.iter_mut() {
            if record.status == PaymentStatus::Pending {
                record.status = PaymentStatus::Completed;
            }
        }
        self.payment_status = PaymentStatus::Completed;
        self.updated_at = now;
    }

    pub fn mark_refunded(&mut self, now: Timestamp) {
        self.payment_status = PaymentStatus::Refunded;
        self.updated_at = now;
    }

    /// Day counts of the current period relative to `now`.
    pub fn period_position(&self, now: Timestamp) -> PeriodPosition {
        PeriodPosition::at(self.start_date, self.end_date, now)
    }

    /// Projects the freeze state at `now`.
    pub fn freeze_status(&self, now: Timestamp, policy: &LifecyclePolicy) -> FreezeStatus {
        let current = match (self.status, self.freeze_start_date) {
            (MembershipStatus::Frozen, Some(started)) => Some(now.days_since(&started)),
            _ => None,
        };

        FreezeStatus {
            status: self.status,
            freeze_start_date: self.freeze_start_date,
            freeze_history: self.freeze_history.clone(),
            current_freeze_duration_days: current,
            remaining_freeze_days: current.map(|days| policy.remaining_freeze_days(days)),
        }
    }

    fn transition(
        &mut self,
        target: MembershipStatus,
        attempted: &'static str,
    ) -> Result<(), MembershipError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| MembershipError::invalid_transition(self.status, attempted))?;
        Ok(())
    }
}
