//! Membership lifecycle error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation | 400 |
//! | InvalidInterval | 400 |
//! | InvalidPlan | 400 |
//! | UnsupportedExtension | 400 |
//! | NotFound | 404 |
//! | InvalidTransition | 409 |
//! | FreezeTooShort | 409 |
//! | AlreadyExists | 409 |
//! | Conflict | 409 |
//! | Payment | 402 |
//! | Infrastructure | 500 |

use std::fmt;

use crate::domain::foundation::{AccountId, DomainError, ErrorCode, ValidationError};
use crate::domain::pricing::PricingError;

use super::MembershipStatus;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Membership,
    Account,
    Plan,
    Addon,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::Membership => "Membership",
            Resource::Account => "Account",
            Resource::Plan => "Plan",
            Resource::Addon => "Add-on service",
        };
        f.write_str(s)
    }
}

/// Errors returned by lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    #[error("Cannot {attempted} membership in {current} state")]
    InvalidTransition {
        current: MembershipStatus,
        attempted: &'static str,
    },

    #[error("Freeze lasted {days} days; the minimum before unfreezing is {minimum}")]
    FreezeTooShort { days: i64, minimum: i64 },

    #[error("Cannot extend by {0} months; supported values are 1, 3 and 12")]
    UnsupportedExtension(u32),

    #[error("Unrecognized billing interval '{0}'")]
    InvalidInterval(String),

    #[error("Plan '{0}' cannot be priced")]
    InvalidPlan(String),

    #[error("Account {0} already has an active membership")]
    AlreadyExists(AccountId),

    /// Lost an optimistic-concurrency race in the store.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Gateway failure. `message` is safe to show; provider details stay in logs.
    #[error("Payment failed: {message}")]
    Payment {
        code: String,
        message: String,
        retryable: bool,
    },

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl MembershipError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MembershipError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: impl fmt::Display) -> Self {
        MembershipError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// The account exists but has no current membership.
    pub fn no_current_membership(account_id: AccountId) -> Self {
        MembershipError::NotFound {
            resource: Resource::Membership,
            id: format!("current membership of account {}", account_id),
        }
    }

    pub fn invalid_transition(current: MembershipStatus, attempted: &'static str) -> Self {
        MembershipError::InvalidTransition { current, attempted }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::Validation { .. } => ErrorCode::ValidationFailed,
            MembershipError::NotFound { resource, .. } => match resource {
                Resource::Membership => ErrorCode::MembershipNotFound,
                Resource::Account => ErrorCode::AccountNotFound,
                Resource::Plan => ErrorCode::PlanNotFound,
                Resource::Addon => ErrorCode::AddonNotFound,
            },
            MembershipError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            MembershipError::FreezeTooShort { .. } => ErrorCode::FreezeTooShort,
            MembershipError::UnsupportedExtension(_) => ErrorCode::UnsupportedExtension,
            MembershipError::InvalidInterval(_) => ErrorCode::InvalidInterval,
            MembershipError::InvalidPlan(_) => ErrorCode::InvalidPlan,
            MembershipError::AlreadyExists(_) => ErrorCode::MembershipExists,
            MembershipError::Conflict(_) => ErrorCode::ConcurrentModification,
            MembershipError::Payment { .. } => ErrorCode::PaymentFailed,
            MembershipError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a message safe to show to the caller.
    ///
    /// Infrastructure details are replaced by a generic message.
    pub fn message(&self) -> String {
        match self {
            MembershipError::Infrastructure(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MembershipError::Conflict(_) | MembershipError::Infrastructure(_) => true,
            MembershipError::Payment { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<PricingError> for MembershipError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidPlan { plan, .. } => MembershipError::InvalidPlan(plan),
            PricingError::InvalidInterval(name) => MembershipError::InvalidInterval(name),
            PricingError::UnsupportedExtension(months) => {
                MembershipError::UnsupportedExtension(months)
            }
            PricingError::Overflow(what) => {
                MembershipError::validation("amount", format!("overflow computing {}", what))
            }
        }
    }
}

impl From<ValidationError> for MembershipError {
    fn from(err: ValidationError) -> Self {
        let field = err.field().to_string();
        MembershipError::Validation {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ConcurrentModification => MembershipError::Conflict(err.message),
            ErrorCode::ValidationFailed => MembershipError::Validation {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => MembershipError::Infrastructure(err.to_string()),
        }
    }
}

impl From<MembershipError> for DomainError {
    fn from(err: MembershipError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{MembershipId, PlanId};

    #[test]
    fn not_found_code_follows_resource() {
        assert_eq!(
            MembershipError::not_found(Resource::Plan, PlanId::new()).code(),
            ErrorCode::PlanNotFound
        );
        assert_eq!(
            MembershipError::not_found(Resource::Membership, MembershipId::new()).code(),
            ErrorCode::MembershipNotFound
        );
        assert_eq!(
            MembershipError::no_current_membership(AccountId::new()).code(),
            ErrorCode::MembershipNotFound
        );
    }

    #[test]
    fn invalid_transition_message_names_state_and_action() {
        let err = MembershipError::invalid_transition(MembershipStatus::Active, "unfreeze");
        assert_eq!(err.message(), "Cannot unfreeze membership in active state");
        assert_eq!(err.code().to_string(), "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn infrastructure_message_hides_details() {
        let err = MembershipError::infrastructure("connection refused to 10.0.0.3:5432");
        assert!(!err.message().contains("10.0.0.3"));
        assert!(err.to_string().contains("10.0.0.3"));
        assert!(err.is_retryable());
    }

    #[test]
    fn pricing_errors_map_onto_taxonomy() {
        assert_eq!(
            MembershipError::from(PricingError::InvalidInterval("weekly".into())),
            MembershipError::InvalidInterval("weekly".into())
        );
        assert_eq!(
            MembershipError::from(PricingError::UnsupportedExtension(6)).code(),
            ErrorCode::UnsupportedExtension
        );
        assert_eq!(
            MembershipError::from(PricingError::InvalidPlan {
                plan: "Free".into(),
                base_price: rust_decimal::Decimal::ZERO,
            })
            .code(),
            ErrorCode::InvalidPlan
        );
    }

    #[test]
    fn domain_conflict_becomes_conflict() {
        let err: MembershipError = DomainError::conflict("Membership", "abc").into();
        assert!(matches!(err, MembershipError::Conflict(_)));
        assert_eq!(err.code(), ErrorCode::ConcurrentModification);
    }

    #[test]
    fn freeze_too_short_reports_days() {
        let err = MembershipError::FreezeTooShort { days: 5, minimum: 7 };
        assert!(err.message().contains('5'));
        assert!(err.message().contains('7'));
    }
}
