//! Billing policy configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::membership::{
    LifecyclePolicy, FREEZE_STATUS_CEILING_DAYS, FULL_REFUND_WINDOW_DAYS,
    MAX_FREEZE_CREDIT_DAYS, MIN_FREEZE_DAYS,
};

use super::error::ValidationError;

/// Lifecycle tunables; every field defaults to the built-in policy.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_min_freeze_days")]
    pub min_freeze_days: i64,

    #[serde(default = "default_max_freeze_credit_days")]
    pub max_freeze_credit_days: i64,

    /// Budget reported by the freeze-status query
    #[serde(default = "default_freeze_status_ceiling_days")]
    pub freeze_status_ceiling_days: i64,

    #[serde(default = "default_full_refund_window_days")]
    pub full_refund_window_days: i64,

    /// Plan-change differences at or below this amount move no money
    #[serde(default = "default_edit_epsilon")]
    pub edit_epsilon: Decimal,

    /// Live memberships allowed per time slot
    #[serde(default = "default_slot_capacity")]
    pub slot_capacity: u32,

    #[serde(default = "default_reject_second_active")]
    pub reject_second_active: bool,
}

impl BillingConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            min_freeze_days: self.min_freeze_days,
            max_freeze_credit_days: self.max_freeze_credit_days,
            freeze_status_ceiling_days: self.freeze_status_ceiling_days,
            full_refund_window_days: self.full_refund_window_days,
            edit_epsilon: self.edit_epsilon,
            slot_capacity: self.slot_capacity,
            reject_second_active: self.reject_second_active,
        }
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_freeze_days < 0 {
            return Err(ValidationError::InvalidBillingPolicy("min_freeze_days"));
        }
        if self.max_freeze_credit_days < 0 {
            return Err(ValidationError::InvalidBillingPolicy("max_freeze_credit_days"));
        }
        if self.freeze_status_ceiling_days < 0 {
            return Err(ValidationError::InvalidBillingPolicy(
                "freeze_status_ceiling_days",
            ));
        }
        if self.full_refund_window_days < 0 {
            return Err(ValidationError::InvalidBillingPolicy("full_refund_window_days"));
        }
        if self.edit_epsilon < Decimal::ZERO {
            return Err(ValidationError::InvalidBillingPolicy("edit_epsilon"));
        }
        if self.slot_capacity == 0 {
            return Err(ValidationError::InvalidBillingPolicy("slot_capacity"));
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            min_freeze_days: default_min_freeze_days(),
            max_freeze_credit_days: default_max_freeze_credit_days(),
            freeze_status_ceiling_days: default_freeze_status_ceiling_days(),
            full_refund_window_days: default_full_refund_window_days(),
            edit_epsilon: default_edit_epsilon(),
            slot_capacity: default_slot_capacity(),
            reject_second_active: default_reject_second_active(),
        }
    }
}

fn default_min_freeze_days() -> i64 {
    MIN_FREEZE_DAYS
}

fn default_max_freeze_credit_days() -> i64 {
    MAX_FREEZE_CREDIT_DAYS
}

fn default_freeze_status_ceiling_days() -> i64 {
    FREEZE_STATUS_CEILING_DAYS
}

fn default_full_refund_window_days() -> i64 {
    FULL_REFUND_WINDOW_DAYS
}

fn default_edit_epsilon() -> Decimal {
    LifecyclePolicy::default().edit_epsilon
}

fn default_slot_capacity() -> u32 {
    LifecyclePolicy::default().slot_capacity
}

fn default_reject_second_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_built_in_policy() {
        let policy = BillingConfig::default().policy();
        let built_in = LifecyclePolicy::default();

        assert_eq!(policy.min_freeze_days, built_in.min_freeze_days);
        assert_eq!(policy.max_freeze_credit_days, built_in.max_freeze_credit_days);
        assert_eq!(
            policy.freeze_status_ceiling_days,
            built_in.freeze_status_ceiling_days
        );
        assert_eq!(policy.edit_epsilon, Decimal::new(1, 2));
        assert_eq!(policy.slot_capacity, 20);
        assert!(policy.reject_second_active);
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config = BillingConfig {
            slot_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidBillingPolicy("slot_capacity"))
        );
    }

    #[test]
    fn test_validation_rejects_negative_epsilon() {
        let config = BillingConfig {
            edit_epsilon: Decimal::new(-1, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
