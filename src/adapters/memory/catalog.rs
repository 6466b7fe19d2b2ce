//! In-memory CatalogReader seeded by the caller.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::catalog::{AddonService, BillingInterval, Discount, Plan};
use crate::domain::foundation::{AddonId, DomainError, PlanId};
use crate::ports::CatalogReader;

#[derive(Debug, Default)]
struct Entries {
    plans: Vec<Plan>,
    addons: Vec<AddonService>,
    discounts: Vec<Discount>,
}

/// Catalog held in memory; insertion order is catalog order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_plan(&self, plan: Plan) {
        self.entries.write().await.plans.push(plan);
    }

    pub async fn add_addon(&self, addon: AddonService) {
        self.entries.write().await.addons.push(addon);
    }

    pub async fn add_discount(&self, discount: Discount) {
        self.entries.write().await.discounts.push(discount);
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self
            .entries
            .read()
            .await
            .plans
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn find_addons(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, DomainError> {
        Ok(self
            .entries
            .read()
            .await
            .addons
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn discounts_for(&self, interval: BillingInterval) -> Result<Vec<Discount>, DomainError> {
        Ok(self
            .entries
            .read()
            .await
            .discounts
            .iter()
            .filter(|d| d.interval == interval)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Percentage;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn lookups_return_seeded_entries() {
        let catalog = InMemoryCatalog::new();
        let plan = Plan::new("Gold", Decimal::from(50));
        let sauna = AddonService::new("Sauna", Decimal::from(10), "wellness");
        let towel = AddonService::new("Towel", Decimal::from(2), "amenity");
        catalog.add_plan(plan.clone()).await;
        catalog.add_addon(sauna.clone()).await;
        catalog.add_addon(towel).await;
        catalog
            .add_discount(Discount::new(
                "Q10",
                Percentage::whole(10),
                BillingInterval::Quarterly,
            ))
            .await;

        assert_eq!(catalog.find_plan(&plan.id).await.unwrap(), Some(plan));
        assert_eq!(
            catalog.find_addons(&[sauna.id, AddonId::new()]).await.unwrap(),
            vec![sauna]
        );
        assert_eq!(
            catalog
                .discounts_for(BillingInterval::Quarterly)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(catalog
            .discounts_for(BillingInterval::Monthly)
            .await
            .unwrap()
            .is_empty());
    }
}
