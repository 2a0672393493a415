use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool, Result};

use crate::db::models::DeliveryRecord;

// --- Delivery Record Service Functions ---

/// A record to be inserted; ids and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDeliveryRecord {
    pub account_id: i32,
    pub destination_id: i32,
    pub message: String,
    pub status: String,
    pub response_code: Option<i32>,
    pub error_message: Option<String>,
    pub template_id: Option<i32>,
    pub batch_id: String,
}

/// Inserts one audit record. Takes an executor so a dispatch can write all
/// of its records on a single transaction.
pub async fn insert_record<'e, E: PgExecutor<'e>>(
    executor: E,
    record: &NewDeliveryRecord,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO delivery_records
           (account_id, destination_id, message, status, response_code, error_message, template_id, batch_id, sent_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.account_id)
    .bind(record.destination_id)
    .bind(&record.message)
    .bind(&record.status)
    .bind(record.response_code)
    .bind(&record.error_message)
    .bind(record.template_id)
    .bind(&record.batch_id)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn recent_for_account(
    pool: &PgPool,
    account_id: i32,
    limit: i64,
) -> Result<Vec<DeliveryRecord>> {
    sqlx::query_as::<_, DeliveryRecord>(
        "SELECT * FROM delivery_records WHERE account_id = $1 ORDER BY sent_at DESC, id DESC LIMIT $2",
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Aggregate delivery statistics for an account. Cached by the web layer;
/// the dispatcher invalidates the cache entry whenever new records land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    pub total_destinations: i64,
    pub success_count: i64,
    pub failed_count: i64,
    pub total_count: i64,
}

pub async fn stats_for_account(pool: &PgPool, account_id: i32) -> Result<AccountStats> {
    let total_destinations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM destinations WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(pool)
            .await?;
    let success_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery_records WHERE account_id = $1 AND status = 'success'",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;
    let failed_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM delivery_records WHERE account_id = $1 AND status = 'failed'",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await?;

    Ok(AccountStats {
        total_destinations,
        success_count,
        failed_count,
        total_count: success_count + failed_count,
    })
}
