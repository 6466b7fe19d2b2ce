//! Strongly-typed identifier value objects.
//!
//! Every record the lifecycle engine touches is addressed by a UUID-backed
//! newtype so that an `AccountId` can never be passed where a `MembershipId`
//! is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID newtype identifier with the standard constructors,
/// `Display`, `FromStr` and transparent serde representation.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a customer account.
    AccountId
}

uuid_id! {
    /// Identifier of a membership (one subscription instance).
    MembershipId
}

uuid_id! {
    /// Identifier of a catalog plan.
    PlanId
}

uuid_id! {
    /// Identifier of a catalog add-on service.
    AddonId
}

uuid_id! {
    /// Identifier of a catalog discount.
    DiscountId
}
