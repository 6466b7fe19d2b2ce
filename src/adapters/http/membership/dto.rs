//! HTTP DTOs (Data Transfer Objects) for membership endpoints.
//!
//! These types define the JSON request/response structure for the membership API.
//! They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::IssuedRefund;
use crate::application::handlers::membership::{
    CancelMembershipResult, CheckAvailabilityResult, ConfirmPaymentResult, CreateMembershipResult,
    EditMembershipResult, ExtendMembershipResult, FreezeMembershipResult, GetMembershipResult,
    UnfreezeMembershipResult,
};
use crate::domain::catalog::BillingInterval;
use crate::domain::foundation::{AddonId, MembershipId, PlanId, Timestamp};
use crate::domain::membership::{
    FreezeRecord, FreezeStatus, Membership, MembershipStatus, PaymentStatus,
};
use crate::domain::pricing::AdjustmentAction;
use crate::ports::{PaymentIntentStatus, RefundStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to purchase a membership.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembershipRequest {
    pub plan_id: PlanId,
    #[serde(default)]
    pub addon_ids: Vec<AddonId>,
    pub time_slot: String,
    /// `monthly`, `quarterly` or `yearly`.
    pub interval: String,
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Request to extend the current membership.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtendMembershipRequest {
    /// 1, 3 or 12.
    pub months: u32,
}

/// Request to change plan and add-ons.
#[derive(Debug, Clone, Deserialize)]
pub struct EditMembershipRequest {
    pub plan_id: PlanId,
    #[serde(default)]
    pub addon_ids: Vec<AddonId>,
}

/// Query string for availability checks.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub time_slot: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Membership view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipView {
    pub id: MembershipId,
    pub plan_id: PlanId,
    pub addon_ids: Vec<AddonId>,
    pub interval: BillingInterval,
    pub goals: Vec<String>,
    pub time_slot: String,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub status: MembershipStatus,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub freeze_start_date: Option<Timestamp>,
    pub freeze_history: Vec<FreezeRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Membership> for MembershipView {
    fn from(m: Membership) -> Self {
        Self {
            id: m.id,
            plan_id: m.plan_id,
            addon_ids: m.addon_ids,
            interval: m.interval,
            goals: m.goals,
            time_slot: m.time_slot.as_str().to_string(),
            total_price: m.total_price,
            payment_status: m.payment_status,
            status: m.status,
            start_date: m.start_date,
            end_date: m.end_date,
            freeze_start_date: m.freeze_start_date,
            freeze_history: m.freeze_history,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
    pub membership: MembershipView,
    pub history: Vec<MembershipView>,
}

impl From<GetMembershipResult> for MembershipResponse {
    fn from(result: GetMembershipResult) -> Self {
        Self {
            membership: result.membership.into(),
            history: result.history.into_iter().map(MembershipView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMembershipResponse {
    pub membership: MembershipView,
    pub charged_amount: Decimal,
    pub payment_client_secret: String,
}

impl From<CreateMembershipResult> for CreateMembershipResponse {
    fn from(result: CreateMembershipResult) -> Self {
        Self {
            membership: result.membership.into(),
            charged_amount: result.charged_amount,
            payment_client_secret: result.payment_client_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FreezeResponse {
    pub status: MembershipStatus,
    pub freeze_start_date: Timestamp,
}

impl From<FreezeMembershipResult> for FreezeResponse {
    fn from(result: FreezeMembershipResult) -> Self {
        Self {
            status: result.status,
            freeze_start_date: result.freeze_start_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnfreezeResponse {
    pub status: MembershipStatus,
    pub new_end_date: Timestamp,
    pub extension_days: i64,
    pub freeze_duration_days: i64,
}

impl From<UnfreezeMembershipResult> for UnfreezeResponse {
    fn from(result: UnfreezeMembershipResult) -> Self {
        Self {
            status: result.status,
            new_end_date: result.new_end_date,
            extension_days: result.extension_days,
            freeze_duration_days: result.freeze_duration_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub refund_amount: Decimal,
    /// `succeeded`, `pending`, `failed`, `canceled`, `not_required` or `skipped`.
    pub refund_status: String,
    /// Refunds the gateway accepted, one per charge.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refunds: Vec<RefundLeg>,
    pub warnings: Vec<String>,
}

impl From<CancelMembershipResult> for CancelResponse {
    fn from(result: CancelMembershipResult) -> Self {
        Self {
            refund_amount: result.refund_amount,
            refund_status: result.refund.status_label().to_string(),
            refunds: result.refund.issued().iter().map(RefundLeg::from).collect(),
            warnings: result.warnings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtendResponse {
    pub extension_cost: Decimal,
    pub interval: BillingInterval,
    pub new_end_date: Timestamp,
    pub payment_client_secret: String,
}

impl From<ExtendMembershipResult> for ExtendResponse {
    fn from(result: ExtendMembershipResult) -> Self {
        Self {
            extension_cost: result.extension_cost,
            interval: result.interval,
            new_end_date: result.new_end_date,
            payment_client_secret: result.payment_client_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundLeg {
    pub refund_reference: String,
    pub amount: Decimal,
    pub status: RefundStatus,
}

impl From<&IssuedRefund> for RefundLeg {
    fn from(refund: &IssuedRefund) -> Self {
        Self {
            refund_reference: refund.refund_reference.clone(),
            amount: refund.amount,
            status: refund.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundDetails {
    pub amount: Decimal,
    pub refunds: Vec<RefundLeg>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub membership: MembershipView,
    pub adjustment: AdjustmentAction,
    pub payment_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_details: Option<RefundDetails>,
}

impl From<EditMembershipResult> for EditResponse {
    fn from(result: EditMembershipResult) -> Self {
        Self {
            membership: result.membership.into(),
            adjustment: result.adjustment,
            payment_required: result.payment_required,
            payment_client_secret: result.payment_client_secret,
            refund_details: result.refund.map(|r| RefundDetails {
                amount: r.amount,
                refunds: r.refunds.iter().map(RefundLeg::from).collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FreezeStatusResponse {
    pub status: MembershipStatus,
    pub freeze_start_date: Option<Timestamp>,
    pub freeze_history: Vec<FreezeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_freeze_duration_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_freeze_days: Option<i64>,
}

impl From<FreezeStatus> for FreezeStatusResponse {
    fn from(status: FreezeStatus) -> Self {
        Self {
            status: status.status,
            freeze_start_date: status.freeze_start_date,
            freeze_history: status.freeze_history,
            current_freeze_duration_days: status.current_freeze_duration_days,
            remaining_freeze_days: status.remaining_freeze_days,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub is_available: bool,
    pub remaining_slots: u32,
    pub capacity: u32,
}

impl From<CheckAvailabilityResult> for AvailabilityResponse {
    fn from(result: CheckAvailabilityResult) -> Self {
        Self {
            is_available: result.is_available,
            remaining_slots: result.remaining_slots,
            capacity: result.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPaymentResponse {
    pub payment_status: PaymentStatus,
    pub gateway_status: PaymentIntentStatus,
}

impl From<ConfirmPaymentResult> for ConfirmPaymentResponse {
    fn from(result: ConfirmPaymentResult) -> Self {
        Self {
            payment_status: result.payment_status,
            gateway_status: result.gateway_status,
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
