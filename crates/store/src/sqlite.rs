//! SQLite storage for withdrawals

use async_trait::async_trait;
use cashout_core::{
    Amount, DocumentType, NewWithdrawal, PayoutMethod, WithdrawalRequest, WithdrawalStatus,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StoreError;
use crate::store::{new_id, WithdrawalStore};

const SELECT_COLUMNS: &str = "SELECT id, user_id, amount, payout_method, account_number,
        id_document_type, id_document_number, status, created_at, schema_version
     FROM withdrawals";

/// SQLite-backed withdrawal store
#[derive(Clone)]
pub struct SqliteWithdrawalStore {
    pool: SqlitePool,
}

impl SqliteWithdrawalStore {
    /// Connect to `url` (e.g. `sqlite:cashout.db?mode=rwc`) and create the schema
    ///
    /// In-memory URLs get a single-connection pool, see [`Self::in_memory`].
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = if is_memory_url(url) {
            single_connection(url).await?
        } else {
            SqlitePool::connect(url).await?
        };
        Self::with_pool(pool).await
    }

    /// Create an in-memory store (for testing)
    ///
    /// Every pooled connection to `:memory:` would see its own database,
    /// so the pool is pinned to one connection.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = single_connection("sqlite::memory:").await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and create the schema
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Initialize the schema
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS withdrawals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                payout_method TEXT NOT NULL,
                account_number TEXT NOT NULL,
                id_document_type TEXT NOT NULL,
                id_document_number TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL,
                schema_version INTEGER NOT NULL,
                claimed_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_withdrawals_user
            ON withdrawals(user_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl WithdrawalStore for SqliteWithdrawalStore {
    async fn insert(&self, new: NewWithdrawal) -> Result<WithdrawalRequest, StoreError> {
        // Stored at microsecond precision so rows sort and round-trip exactly
        let record = WithdrawalRequest::create(new_id(), new, Utc::now().trunc_subsecs(6));

        sqlx::query(
            r#"
            INSERT INTO withdrawals
                (id, user_id, amount, payout_method, account_number,
                 id_document_type, id_document_number, status, created_at, schema_version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.amount.value().to_string())
        .bind(record.payout_method.as_str())
        .bind(&record.account_number)
        .bind(record.id_document_type.code())
        .bind(&record.id_document_number)
        .bind(record.status.as_str())
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(i64::from(record.schema_version))
        .execute(&self.pool)
        .await?;

        tracing::debug!(withdrawal_id = %record.id, user_id = %record.user_id, "Withdrawal stored");
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WithdrawalRequest>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<WithdrawalRequest>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY created_at ASC, rowid ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<WithdrawalRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: WithdrawalStatus,
        next: WithdrawalStatus,
    ) -> Result<bool, StoreError> {
        expected.transition(next)?;

        let result = sqlx::query(
            "UPDATE withdrawals SET status = ?1, claimed_at = NULL WHERE id = ?2 AND status = ?3",
        )
        .bind(next.as_str())
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn try_claim(
        &self,
        id: &str,
        lease: Duration,
    ) -> Result<Option<WithdrawalRequest>, StoreError> {
        let now = Utc::now().timestamp_millis();
        let cutoff = now.saturating_sub(i64::try_from(lease.as_millis()).unwrap_or(i64::MAX));

        let result = sqlx::query(
            r#"
            UPDATE withdrawals SET claimed_at = ?1
            WHERE id = ?2 AND status = 'pending'
              AND (claimed_at IS NULL OR claimed_at < ?3)
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn renew_claim(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawals SET claimed_at = ?1
            WHERE id = ?2 AND status = 'pending' AND claimed_at IS NOT NULL
            "#,
        )
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_claim(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE withdrawals SET claimed_at = NULL WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

async fn single_connection(url: &str) -> Result<SqlitePool, StoreError> {
    // The pool must never drop its only connection, or the database goes with it
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(url)
        .await?;
    Ok(pool)
}

fn decode_row(row: &SqliteRow) -> Result<WithdrawalRequest, StoreError> {
    let id: String = row.try_get("id")?;
    let corrupt = |what: &str, detail: String| StoreError::Corrupt(format!("{id}: {what}: {detail}"));

    let amount_str: String = row.try_get("amount")?;
    let amount = Decimal::from_str(&amount_str)
        .map_err(|e| corrupt("amount", e.to_string()))
        .and_then(|d| Amount::new(d).map_err(|e| corrupt("amount", e.to_string())))?;

    let method_str: String = row.try_get("payout_method")?;
    let payout_method = method_str
        .parse::<PayoutMethod>()
        .map_err(|e| corrupt("payout_method", e.to_string()))?;

    let doc_str: String = row.try_get("id_document_type")?;
    let id_document_type = doc_str
        .parse::<DocumentType>()
        .map_err(|e| corrupt("id_document_type", e.to_string()))?;

    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<WithdrawalStatus>()
        .map_err(|e| corrupt("status", e.to_string()))?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| corrupt("created_at", e.to_string()))?
        .with_timezone(&Utc);

    let schema_version: i64 = row.try_get("schema_version")?;
    let schema_version =
        u16::try_from(schema_version).map_err(|e| corrupt("schema_version", e.to_string()))?;

    Ok(WithdrawalRequest {
        user_id: row.try_get("user_id")?,
        amount,
        payout_method,
        account_number: row.try_get("account_number")?,
        id_document_type,
        id_document_number: row.try_get("id_document_number")?,
        status,
        created_at,
        schema_version,
        id,
    })
}
