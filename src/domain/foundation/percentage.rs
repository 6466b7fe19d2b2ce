//! Percentage value object (0-100 scale) backed by an exact decimal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A value between 0 and 100 inclusive, e.g. a discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    /// Zero percent.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a Percentage, returning error if outside `0..=100`.
    pub fn try_new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(ValidationError::invalid_format(
                "percentage",
                format!("must be between 0 and 100, got {}", value),
            ));
        }
        Ok(Self(value))
    }

    /// Creates a whole-number percentage, clamping to 100.
    pub fn whole(value: u8) -> Self {
        Self(Decimal::from(value.min(100)))
    }

    /// Returns the value on the 0-100 scale.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the value as a fraction (0 to 1).
    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    /// Returns `1 - fraction`, the multiplier left after applying this rate.
    pub fn complement(&self) -> Decimal {
        Decimal::ONE - self.as_fraction()
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}
