//! Catalog reader port.
//!
//! Plans, add-on services and discounts are owned by the catalog subsystem;
//! the lifecycle engine only reads them as pricing inputs.

use async_trait::async_trait;

use crate::domain::catalog::{AddonService, BillingInterval, Discount, Plan};
use crate::domain::foundation::{AddonId, DomainError, PlanId};

/// Read-only access to the catalog.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// Add-ons with the given ids. Unknown ids are omitted from the result.
    async fn find_addons(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, DomainError>;

    /// Discounts keyed to `interval`, active or not, in catalog order.
    async fn discounts_for(&self, interval: BillingInterval) -> Result<Vec<Discount>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn CatalogReader) {}
    }
}
