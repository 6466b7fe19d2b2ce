//! Catalog entries consumed by pricing: plans, add-on services, discounts.
//!
//! These records are owned by the catalog subsystem; the lifecycle engine
//! only reads them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AddonId, DiscountId, Percentage, PlanId};

use super::BillingInterval;

/// A named subscription tier with a monthly base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Monthly base price in major currency units.
    pub base_price: Decimal,
    /// Add-ons bundled with the plan.
    pub included_addons: Vec<AddonId>,
    pub active: bool,
}

impl Plan {
    pub fn new(name: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            id: PlanId::new(),
            name: name.into(),
            base_price,
            included_addons: Vec::new(),
            active: true,
        }
    }

    pub fn with_included_addons(mut self, addons: Vec<AddonId>) -> Self {
        self.included_addons = addons;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An optional paid extra attached to a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonService {
    pub id: AddonId,
    pub name: String,
    /// Monthly price in major currency units.
    pub price: Decimal,
    pub category: String,
    pub active: bool,
}

impl AddonService {
    pub fn new(name: impl Into<String>, price: Decimal, category: impl Into<String>) -> Self {
        Self {
            id: AddonId::new(),
            name: name.into(),
            price,
            category: category.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A percentage reduction keyed to one billing interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub percentage: Percentage,
    pub interval: BillingInterval,
    pub active: bool,
}

impl Discount {
    pub fn new(name: impl Into<String>, percentage: Percentage, interval: BillingInterval) -> Self {
        Self {
            id: DiscountId::new(),
            name: name.into(),
            percentage,
            interval,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// True when this discount is live and keyed to `interval`.
    pub fn applies_to(&self, interval: BillingInterval) -> bool {
        self.active && self.interval == interval
    }
}

/// Picks the first active discount for `interval`.
///
/// At most one is expected per interval; extra matches are ignored.
pub fn select_discount(discounts: &[Discount], interval: BillingInterval) -> Option<&Discount> {
    discounts.iter().find(|d| d.applies_to(interval))
}
