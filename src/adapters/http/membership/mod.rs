//! HTTP adapter for membership endpoints.
//!
//! Exposes the lifecycle manager via REST API under `/api/membership`.
//! Identity comes from the `X-Account-Id` header; authentication happens
//! upstream.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AccountContext, MembershipApiError, MembershipAppState, ACCOUNT_ID_HEADER};
pub use routes::{membership_router, membership_routes};
