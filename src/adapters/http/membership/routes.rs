//! Axum router configuration for membership endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_membership, check_availability, confirm_payment, create_membership, edit_membership,
    extend_membership, freeze_membership, get_freeze_status, get_membership,
    unfreeze_membership, MembershipAppState,
};

/// Create the membership API router.
///
/// # Routes
///
/// ## Account Endpoints (require `X-Account-Id`)
/// - `GET /` - Current membership and history
/// - `POST /` - Purchase a membership
/// - `PUT /` - Change plan and add-ons
/// - `POST /freeze` - Pause the membership
/// - `POST /unfreeze` - Resume and credit the freeze
/// - `GET /freeze-status` - Freeze projection
/// - `POST /cancel` - Cancel with refund
/// - `POST /extend` - Extend by 1, 3 or 12 months
/// - `POST /payment/confirm` - Finalize a pending charge
///
/// ## Public Endpoints
/// - `GET /availability?time_slot=...` - Time-slot capacity
pub fn membership_routes() -> Router<MembershipAppState> {
    Router::new()
        .route(
            "/",
            get(get_membership)
                .post(create_membership)
                .put(edit_membership),
        )
        .route("/freeze", post(freeze_membership))
        .route("/unfreeze", post(unfreeze_membership))
        .route("/freeze-status", get(get_freeze_status))
        .route("/cancel", post(cancel_membership))
        .route("/extend", post(extend_membership))
        .route("/payment/confirm", post(confirm_payment))
        .route("/availability", get(check_availability))
}

/// Create the complete membership module router, mounted at `/membership`.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", membership_router())
///     .with_state(MembershipAppState { manager });
/// ```
pub fn membership_router() -> Router<MembershipAppState> {
    Router::new().nest("/membership", membership_routes())
}
