//! State machine trait for status enums.
//!
//! Lifecycle statuses declare their legal edges once; callers get a validated
//! `transition_to` for free.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for MembershipStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Active, Frozen) | (Frozen, Active))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Active => vec![Frozen],
///             Frozen => vec![Active],
///         }
///     }
/// }
///
/// let next = status.transition_to(MembershipStatus::Frozen)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        Amber,
        Red,
        Off,
    }

    impl StateMachine for Light {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Light::*;
            match self {
                Green => vec![Amber, Off],
                Amber => vec![Red, Off],
                Red => vec![Green, Off],
                Off => vec![],
            }
        }
    }

    #[test]
    fn transition_to_follows_declared_edges() {
        assert_eq!(Light::Green.transition_to(Light::Amber), Ok(Light::Amber));
        assert!(Light::Green.transition_to(Light::Red).is_err());
    }

    #[test]
    fn off_is_terminal() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Red.is_terminal());
    }
}
