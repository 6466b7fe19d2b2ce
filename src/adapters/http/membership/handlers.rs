//! HTTP handlers for membership endpoints.
//!
//! These handlers connect Axum routes to the lifecycle manager.

use axum::extract::{Json, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::membership::CreateMembershipCommand;
use crate::application::MembershipLifecycleManager;
use crate::domain::foundation::AccountId;
use crate::domain::membership::MembershipError;

use super::dto::{
    AvailabilityQuery, AvailabilityResponse, CancelResponse, ConfirmPaymentResponse,
    CreateMembershipRequest, CreateMembershipResponse, EditMembershipRequest, EditResponse,
    ErrorResponse, ExtendMembershipRequest, ExtendResponse, FreezeResponse,
    FreezeStatusResponse, MembershipResponse, UnfreezeResponse,
};

/// Header carrying the caller's account id, set by the upstream auth layer.
pub const ACCOUNT_ID_HEADER: &str = "X-Account-Id";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
#[derive(Clone)]
pub struct MembershipAppState {
    pub manager: MembershipLifecycleManager,
}

// ════════════════════════════════════════════════════════════════════════════════
// Account Context
// ════════════════════════════════════════════════════════════════════════════════

/// Account identity taken from the trusted `X-Account-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct AccountContext {
    pub account_id: AccountId,
}

/// Rejection type for AccountContext extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AccountContext
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<AccountId>().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AccountContext { account_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /membership - Current membership and history
pub async fn get_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.get_membership(account.account_id).await?;
    Ok(Json(MembershipResponse::from(result)))
}

/// GET /membership/freeze-status
pub async fn get_freeze_status(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let status = state.manager.get_freeze_status(account.account_id).await?;
    Ok(Json(FreezeStatusResponse::from(status)))
}

/// GET /membership/availability?time_slot=... - Public
pub async fn check_availability(
    State(state): State<MembershipAppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.check_availability(query.time_slot).await?;
    Ok(Json(AvailabilityResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /membership - Purchase a membership
pub async fn create_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
    Json(request): Json<CreateMembershipRequest>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let cmd = CreateMembershipCommand {
        account_id: account.account_id,
        plan_id: request.plan_id,
        addon_ids: request.addon_ids,
        time_slot: request.time_slot,
        interval: request.interval,
        goals: request.goals,
    };

    let result = state.manager.create(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateMembershipResponse::from(result)),
    ))
}

/// POST /membership/freeze
pub async fn freeze_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.freeze(account.account_id).await?;
    Ok(Json(FreezeResponse::from(result)))
}

/// POST /membership/unfreeze
pub async fn unfreeze_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.unfreeze(account.account_id).await?;
    Ok(Json(UnfreezeResponse::from(result)))
}

/// POST /membership/cancel
///
/// Succeeds even when the refund leg fails; see `warnings` in the body.
pub async fn cancel_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.cancel(account.account_id).await?;
    Ok(Json(CancelResponse::from(result)))
}

/// POST /membership/extend
pub async fn extend_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
    Json(request): Json<ExtendMembershipRequest>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state
        .manager
        .extend(account.account_id, request.months)
        .await?;
    Ok(Json(ExtendResponse::from(result)))
}

/// PUT /membership - Change plan and add-ons
pub async fn edit_membership(
    State(state): State<MembershipAppState>,
    account: AccountContext,
    Json(request): Json<EditMembershipRequest>,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state
        .manager
        .edit(account.account_id, request.plan_id, request.addon_ids)
        .await?;
    Ok(Json(EditResponse::from(result)))
}

/// POST /membership/payment/confirm
pub async fn confirm_payment(
    State(state): State<MembershipAppState>,
    account: AccountContext,
) -> Result<impl IntoResponse, MembershipApiError> {
    let result = state.manager.confirm_payment(account.account_id).await?;
    Ok(Json(ConfirmPaymentResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct MembershipApiError(MembershipError);

impl From<MembershipError> for MembershipApiError {
    fn from(err: MembershipError) -> Self {
        Self(err)
    }
}

impl MembershipApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            MembershipError::Validation { .. }
            | MembershipError::InvalidInterval(_)
            | MembershipError::InvalidPlan(_)
            | MembershipError::UnsupportedExtension(_) => StatusCode::BAD_REQUEST,
            MembershipError::NotFound { .. } => StatusCode::NOT_FOUND,
            MembershipError::InvalidTransition { .. }
            | MembershipError::FreezeTooShort { .. }
            | MembershipError::AlreadyExists(_)
            | MembershipError::Conflict(_) => StatusCode::CONFLICT,
            MembershipError::Payment { .. } => StatusCode::PAYMENT_REQUIRED,
            MembershipError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MembershipApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorResponse::new(self.0.code().to_string(), self.0.message());
        (status, Json(body)).into_response()
    }
}
