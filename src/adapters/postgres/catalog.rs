//! PostgreSQL implementation of CatalogReader.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::catalog::{AddonService, BillingInterval, Discount, Plan};
use crate::domain::foundation::{AddonId, DiscountId, DomainError, Percentage, PlanId};
use crate::ports::CatalogReader;

pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    base_price: Decimal,
    included_addon_ids: Vec<Uuid>,
    active: bool,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            base_price: row.base_price,
            included_addons: row
                .included_addon_ids
                .into_iter()
                .map(AddonId::from_uuid)
                .collect(),
            active: row.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddonRow {
    id: Uuid,
    name: String,
    price: Decimal,
    category: String,
    active: bool,
}

impl From<AddonRow> for AddonService {
    fn from(row: AddonRow) -> Self {
        AddonService {
            id: AddonId::from_uuid(row.id),
            name: row.name,
            price: row.price,
            category: row.category,
            active: row.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: Uuid,
    name: String,
    percentage: Decimal,
    billing_interval: String,
    active: bool,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DomainError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        Ok(Discount {
            id: DiscountId::from_uuid(row.id),
            name: row.name,
            percentage: Percentage::try_new(row.percentage)
                .map_err(|e| DomainError::database(format!("Invalid discount: {}", e)))?,
            interval: row.billing_interval.parse::<BillingInterval>().map_err(|_| {
                DomainError::database(format!("Invalid interval value: {}", row.billing_interval))
            })?,
            active: row.active,
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalog {
    async fn find_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            "SELECT id, name, base_price, included_addon_ids, active FROM plans WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find plan: {}", e)))?;

        Ok(row.map(Plan::from))
    }

    async fn find_addons(&self, ids: &[AddonId]) -> Result<Vec<AddonService>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows: Vec<AddonRow> = sqlx::query_as(
            "SELECT id, name, price, category, active FROM addon_services WHERE id = ANY($1)",
        )
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find add-ons: {}", e)))?;

        Ok(rows.into_iter().map(AddonService::from).collect())
    }

    async fn discounts_for(&self, interval: BillingInterval) -> Result<Vec<Discount>, DomainError> {
        let rows: Vec<DiscountRow> = sqlx::query_as(
            r#"
            SELECT id, name, percentage, billing_interval, active
            FROM discounts
            WHERE billing_interval = $1 AND active
            ORDER BY name
            "#,
        )
        .bind(interval.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list discounts: {}", e)))?;

        rows.into_iter().map(Discount::try_from).collect()
    }
}
