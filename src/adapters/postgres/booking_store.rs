//! PostgreSQL implementation of BookingStore.
//!
//! Accounts and memberships live in two tables; a `WriteBatch` is applied in
//! one transaction with `version` checks on every update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::account::{Account, AccountRole};
use crate::domain::catalog::BillingInterval;
use crate::domain::foundation::{
    AccountId, AddonId, DomainError, ErrorCode, MembershipId, PlanId, Timestamp,
};
use crate::domain::membership::{
    FreezeRecord, Membership, MembershipStatus, PaymentRecord, PaymentStatus, TimeSlot,
};
use crate::ports::{BookingStore, WriteBatch};

const MEMBERSHIP_COLUMNS: &str = r#"
    id, account_id, plan_id, addon_ids, billing_interval, goals, time_slot, total_price,
    payment_reference, payment_status, start_date, end_date, status, freeze_start_date,
    freeze_history, version, created_at, updated_at, payments
"#;

/// PostgreSQL implementation of the BookingStore port.
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    role: String,
    current_membership_id: Option<Uuid>,
    membership_history: Vec<Uuid>,
    version: i64,
}

impl TryFrom<AccountRow> for Account {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = AccountRole::parse(&row.role)
            .ok_or_else(|| DomainError::database(format!("Invalid role value: {}", row.role)))?;

        Ok(Account {
            id: AccountId::from_uuid(row.id),
            role,
            current_membership: row.current_membership_id.map(MembershipId::from_uuid),
            membership_history: row
                .membership_history
                .into_iter()
                .map(MembershipId::from_uuid)
                .collect(),
            version: row.version as u64,
        })
    }
}

/// Database row representation of a membership.
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    account_id: Uuid,
    plan_id: Uuid,
    addon_ids: Vec<Uuid>,
    billing_interval: String,
    goals: Vec<String>,
    time_slot: String,
    total_price: Decimal,
    payment_reference: Option<String>,
    payment_status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    freeze_start_date: Option<DateTime<Utc>>,
    freeze_history: Json<Vec<FreezeRecord>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    payments: Json<Vec<PaymentRecord>>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let interval = row.billing_interval.parse::<BillingInterval>().map_err(|_| {
            DomainError::database(format!("Invalid interval value: {}", row.billing_interval))
        })?;
        let status = MembershipStatus::parse(&row.status)
            .ok_or_else(|| DomainError::database(format!("Invalid status value: {}", row.status)))?;
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            DomainError::database(format!(
                "Invalid payment status value: {}",
                row.payment_status
            ))
        })?;
        let time_slot = TimeSlot::new(row.time_slot)
            .map_err(|e| DomainError::database(format!("Invalid time slot: {}", e)))?;

        Ok(Membership {
            id: MembershipId::from_uuid(row.id),
            account_id: AccountId::from_uuid(row.account_id),
            plan_id: PlanId::from_uuid(row.plan_id),
            addon_ids: row.addon_ids.into_iter().map(AddonId::from_uuid).collect(),
            interval,
            goals: row.goals,
            time_slot,
            total_price: row.total_price,
            payment_reference: row.payment_reference,
            payment_status,
            payments: row.payments.0,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            status,
            freeze_start_date: row.freeze_start_date.map(Timestamp::from_datetime),
            freeze_history: row.freeze_history.0,
            version: row.version as u64,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

fn status_strings(statuses: &[MembershipStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

async fn insert_membership(
    tx: &mut Transaction<'_, Postgres>,
    m: &Membership,
) -> Result<(), DomainError> {
    sqlx::query(&format!(
        "INSERT INTO memberships ({}) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        MEMBERSHIP_COLUMNS
    ))
    .bind(m.id.as_uuid())
    .bind(m.account_id.as_uuid())
    .bind(m.plan_id.as_uuid())
    .bind(m.addon_ids.iter().map(|id| *id.as_uuid()).collect::<Vec<_>>())
    .bind(m.interval.as_str())
    .bind(&m.goals)
    .bind(m.time_slot.as_str())
    .bind(m.total_price)
    .bind(&m.payment_reference)
    .bind(m.payment_status.as_str())
    .bind(m.start_date.as_datetime())
    .bind(m.end_date.as_datetime())
    .bind(m.status.as_str())
    .bind(m.freeze_start_date.as_ref().map(|t| *t.as_datetime()))
    .bind(Json(&m.freeze_history))
    .bind(m.version as i64)
    .bind(m.created_at.as_datetime())
    .bind(m.updated_at.as_datetime())
    .bind(Json(&m.payments))
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert membership", e))?;
    Ok(())
}

async fn update_membership(
    tx: &mut Transaction<'_, Postgres>,
    m: &Membership,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE memberships SET
            plan_id = $3,
            addon_ids = $4,
            goals = $5,
            total_price = $6,
            payment_reference = $7,
            payment_status = $8,
            end_date = $9,
            status = $10,
            freeze_start_date = $11,
            freeze_history = $12,
            updated_at = $13,
            payments = $14,
            version = version + 1
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(m.id.as_uuid())
    .bind(m.version as i64)
    .bind(m.plan_id.as_uuid())
    .bind(m.addon_ids.iter().map(|id| *id.as_uuid()).collect::<Vec<_>>())
    .bind(&m.goals)
    .bind(m.total_price)
    .bind(&m.payment_reference)
    .bind(m.payment_status.as_str())
    .bind(m.end_date.as_datetime())
    .bind(m.status.as_str())
    .bind(m.freeze_start_date.as_ref().map(|t| *t.as_datetime()))
    .bind(Json(&m.freeze_history))
    .bind(m.updated_at.as_datetime())
    .bind(Json(&m.payments))
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update membership", e))?;

    if result.rows_affected() == 0 {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM memberships WHERE id = $1")
            .bind(m.id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("Failed to check membership", e))?;
        return Err(match exists {
            Some(_) => DomainError::conflict("Membership", m.id),
            None => DomainError::new(
                ErrorCode::MembershipNotFound,
                format!("Membership not found: {}", m.id),
            ),
        });
    }
    Ok(())
}

async fn update_account(
    tx: &mut Transaction<'_, Postgres>,
    account: &Account,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts SET
            role = $3,
            current_membership_id = $4,
            membership_history = $5,
            version = version + 1
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(account.id.as_uuid())
    .bind(account.version as i64)
    .bind(account.role.as_str())
    .bind(account.current_membership.as_ref().map(|id| *id.as_uuid()))
    .bind(
        account
            .membership_history
            .iter()
            .map(|id| *id.as_uuid())
            .collect::<Vec<_>>(),
    )
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update account", e))?;

    if result.rows_affected() == 0 {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM accounts WHERE id = $1")
            .bind(account.id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_error("Failed to check account", e))?;
        return Err(match exists {
            Some(_) => DomainError::conflict("Account", account.id),
            None => DomainError::new(
                ErrorCode::AccountNotFound,
                format!("Account not found: {}", account.id),
            ),
        });
    }
    Ok(())
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert_account(&self, account: &Account) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, role, current_membership_id, membership_history, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.role.as_str())
        .bind(account.current_membership.as_ref().map(|id| *id.as_uuid()))
        .bind(
            account
                .membership_history
                .iter()
                .map(|id| *id.as_uuid())
                .collect::<Vec<_>>(),
        )
        .bind(account.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("accounts_pkey") {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        format!("Account {} already exists", account.id),
                    );
                }
            }
            db_error("Failed to insert account", e)
        })?;
        Ok(())
    }

    async fn find_account(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, role, current_membership_id, membership_history, version
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find account", e))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_membership(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE id = $1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find membership", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_by_account(&self, account_id: &AccountId) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE account_id = $1 ORDER BY created_at",
            MEMBERSHIP_COLUMNS
        ))
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list memberships", e))?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn find_by_time_slot_and_status(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE time_slot = $1 AND status = ANY($2)",
            MEMBERSHIP_COLUMNS
        ))
        .bind(slot.as_str())
        .bind(status_strings(statuses))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query time slot", e))?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn count_by_time_slot(
        &self,
        slot: &TimeSlot,
        statuses: &[MembershipStatus],
    ) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM memberships WHERE time_slot = $1 AND status = ANY($2)",
        )
        .bind(slot.as_str())
        .bind(status_strings(statuses))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count time slot", e))?;

        Ok(count as u64)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        for membership in &batch.insert_memberships {
            insert_membership(&mut tx, membership).await?;
        }
        for membership in &batch.update_memberships {
            update_membership(&mut tx, membership).await?;
        }
        for account in &batch.update_accounts {
            update_account(&mut tx, account).await?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }
}
