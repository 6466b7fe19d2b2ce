//! Pricing engine - pure computation of membership totals.

use rust_decimal::Decimal;

use crate::domain::catalog::{AddonService, BillingInterval, Discount, Plan};

/// Errors raised by pricing computations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// Plan has a zero or negative base price.
    #[error("plan '{plan}' has a non-positive base price ({base_price})")]
    InvalidPlan { plan: String, base_price: Decimal },

    /// Interval is not in the multiplier table.
    #[error("unrecognized billing interval '{0}'")]
    InvalidInterval(String),

    /// Extension length has no equivalent interval.
    #[error("cannot extend by {0} months; supported values are 1, 3 and 12")]
    UnsupportedExtension(u32),

    /// Arithmetic left the representable decimal range.
    #[error("amount overflow while computing {0}")]
    Overflow(&'static str),
}

/// Stateless pricing calculator.
///
/// Amounts carry full decimal precision; rounding to minor units happens
/// only at the transaction boundary (see `proration::round_minor`).
pub struct PricingEngine;

impl PricingEngine {
    /// Computes the total for a plan, selected add-ons and interval.
    ///
    /// `(base_price + Σ addon.price) × multiplier × (1 − discount%)`, where
    /// the discount only counts when it is active and keyed to `interval`.
    pub fn compute_total(
        plan: &Plan,
        addons: &[AddonService],
        interval: BillingInterval,
        discount: Option<&Discount>,
    ) -> Result<Decimal, PricingError> {
        Self::ensure_priced(plan)?;

        let base = addons
            .iter()
            .try_fold(plan.base_price, |acc, addon| acc.checked_add(addon.price))
            .ok_or(PricingError::Overflow("base price"))?;

        let gross = base
            .checked_mul(Decimal::from(interval.multiplier()))
            .ok_or(PricingError::Overflow("interval total"))?;

        Self::apply_discount(gross, interval, discount)
    }

    /// Like [`compute_total`](Self::compute_total) for an interval given by name.
    ///
    /// Unknown names fail with `InvalidInterval`; there is no fallback.
    pub fn compute_total_named(
        plan: &Plan,
        addons: &[AddonService],
        interval: &str,
        discount: Option<&Discount>,
    ) -> Result<Decimal, PricingError> {
        let interval = Self::parse_interval(interval)?;
        Self::compute_total(plan, addons, interval, discount)
    }

    /// Parses an interval name, rejecting anything outside the table.
    pub fn parse_interval(name: &str) -> Result<BillingInterval, PricingError> {
        name.parse::<BillingInterval>()
            .map_err(|e| PricingError::InvalidInterval(e.0))
    }

    /// Maps an extension length to its interval.
    pub fn extension_interval(months: u32) -> Result<BillingInterval, PricingError> {
        BillingInterval::from_months(months).ok_or(PricingError::UnsupportedExtension(months))
    }

    /// Cost of extending a membership by `months`.
    ///
    /// `plan.base_price × months`, discounted by an active discount keyed to
    /// the interval equivalent to `months`. Add-ons are not charged again.
    pub fn extension_cost(
        plan: &Plan,
        months: u32,
        discount: Option<&Discount>,
    ) -> Result<(BillingInterval, Decimal), PricingError> {
        let interval = Self::extension_interval(months)?;
        Self::ensure_priced(plan)?;

        let gross = plan
            .base_price
            .checked_mul(Decimal::from(months))
            .ok_or(PricingError::Overflow("extension cost"))?;

        Ok((interval, Self::apply_discount(gross, interval, discount)?))
    }

    fn ensure_priced(plan: &Plan) -> Result<(), PricingError> {
        if plan.base_price <= Decimal::ZERO {
            return Err(PricingError::InvalidPlan {
                plan: plan.name.clone(),
                base_price: plan.base_price,
            });
        }
        Ok(())
    }

    fn apply_discount(
        amount: Decimal,
        interval: BillingInterval,
        discount: Option<&Discount>,
    ) -> Result<Decimal, PricingError> {
        match discount.filter(|d| d.applies_to(interval)) {
            Some(d) => amount
                .checked_mul(d.percentage.complement())
                .ok_or(PricingError::Overflow("discount")),
            None => Ok(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Percentage;
    use proptest::prelude::*;

    fn plan(price: i64) -> Plan {
        Plan::new("Standard", Decimal::from(price))
    }

    fn addon(price: i64) -> AddonService {
        AddonService::new("Sauna", Decimal::from(price), "wellness")
    }

    #[test]
    fn quarterly_with_addon_and_discount() {
        let discount = Discount::new("Q10", Percentage::whole(10), BillingInterval::Quarterly);
        let total = PricingEngine::compute_total(
            &plan(50),
            &[addon(10)],
            BillingInterval::Quarterly,
            Some(&discount),
        )
        .unwrap();

        assert_eq!(total, Decimal::from(162));
    }

    #[test]
    fn discount_for_other_interval_is_ignored() {
        let discount = Discount::new("Y20", Percentage::whole(20), BillingInterval::Yearly);
        let total =
            PricingEngine::compute_total(&plan(40), &[], BillingInterval::Monthly, Some(&discount))
                .unwrap();

        assert_eq!(total, Decimal::from(40));
    }

    #[test]
    fn inactive_discount_is_ignored() {
        let discount =
            Discount::new("Y20", Percentage::whole(20), BillingInterval::Yearly).inactive();
        let total =
            PricingEngine::compute_total(&plan(10), &[], BillingInterval::Yearly, Some(&discount))
                .unwrap();

        assert_eq!(total, Decimal::from(120));
    }

    #[test]
    fn keeps_full_precision() {
        let discount = Discount::new(
            "odd",
            Percentage::try_new(Decimal::new(333, 1)).unwrap(),
            BillingInterval::Monthly,
        );
        let total = PricingEngine::compute_total(
            &Plan::new("p", Decimal::new(1999, 2)),
            &[],
            BillingInterval::Monthly,
            Some(&discount),
        )
        .unwrap();

        // 19.99 × 0.667 = 13.33333
        assert_eq!(total, Decimal::new(1_333_333, 5));
    }

    #[test]
    fn non_positive_base_price_is_invalid_plan() {
        let err = PricingEngine::compute_total(&plan(0), &[], BillingInterval::Monthly, None)
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidPlan { .. }));

        let err = PricingEngine::compute_total(&plan(-5), &[], BillingInterval::Monthly, None)
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidPlan { .. }));
    }

    #[test]
    fn unknown_interval_name_is_rejected() {
        let err = PricingEngine::compute_total_named(&plan(10), &[], "biweekly", None).unwrap_err();
        assert_eq!(err, PricingError::InvalidInterval("biweekly".to_string()));
    }

    #[test]
    fn extension_cost_uses_months_and_matching_discount() {
        let discount = Discount::new("Y25", Percentage::whole(25), BillingInterval::Yearly);
        let (interval, cost) =
            PricingEngine::extension_cost(&plan(20), 12, Some(&discount)).unwrap();

        assert_eq!(interval, BillingInterval::Yearly);
        assert_eq!(cost, Decimal::from(180));
    }

    #[test]
    fn extension_rejects_unmapped_months() {
        assert_eq!(
            PricingEngine::extension_cost(&plan(20), 6, None).unwrap_err(),
            PricingError::UnsupportedExtension(6)
        );
    }

    fn interval_strategy() -> impl Strategy<Value = BillingInterval> {
        prop_oneof![
            Just(BillingInterval::Monthly),
            Just(BillingInterval::Quarterly),
            Just(BillingInterval::Yearly),
        ]
    }

    proptest! {
        #[test]
        fn total_matches_closed_form(
            base_cents in 1i64..1_000_000,
            addon_cents in proptest::collection::vec(0i64..100_000, 0..5),
            interval in interval_strategy(),
            discount_interval in interval_strategy(),
            pct in 0u8..=100,
        ) {
            let plan = Plan::new("p", Decimal::new(base_cents, 2));
            let addons: Vec<AddonService> = addon_cents
                .iter()
                .map(|c| AddonService::new("a", Decimal::new(*c, 2), "x"))
                .collect();
            let discount = Discount::new("d", Percentage::whole(pct), discount_interval);

            let total = PricingEngine::compute_total(&plan, &addons, interval, Some(&discount)).unwrap();

            let base = Decimal::new(base_cents + addon_cents.iter().sum::<i64>(), 2);
            let mut expected = base * Decimal::from(interval.multiplier());
            if discount_interval == interval {
                expected *= Decimal::ONE - Decimal::from(pct) / Decimal::ONE_HUNDRED;
            }
            prop_assert_eq!(total, expected);
        }

        #[test]
        fn unrecognized_interval_always_fails(name in "[a-z]{1,12}") {
            prop_assume!(!["monthly", "quarterly", "yearly"].contains(&name.as_str()));
            let plan = Plan::new("p", Decimal::ONE);
            prop_assert!(matches!(
                PricingEngine::compute_total_named(&plan, &[], &name, None),
                Err(PricingError::InvalidInterval(_))
            ));
        }
    }
}
