use chrono::Utc;
use sqlx::{PgPool, Result};

use crate::db::models::Destination;

// --- Destination Service Functions ---

pub async fn create_destination(
    pool: &PgPool,
    account_id: i32,
    name: &str,
    platform_type: &str,
    endpoint: &str,
    secret: Option<&str>,
) -> Result<Destination> {
    sqlx::query_as::<_, Destination>(
        "INSERT INTO destinations (account_id, name, platform_type, endpoint, secret, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, TRUE, $6) RETURNING *",
    )
    .bind(account_id)
    .bind(name)
    .bind(platform_type)
    .bind(endpoint)
    .bind(secret)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn list_destinations_for_account(pool: &PgPool, account_id: i32) -> Result<Vec<Destination>> {
    sqlx::query_as::<_, Destination>(
        "SELECT * FROM destinations WHERE account_id = $1 ORDER BY id",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
}

/// The candidate set for a dispatch: the owner's active destinations,
/// optionally narrowed to one name. Ordered by id so dispatch results have a
/// stable destination ordering regardless of send completion order.
pub async fn active_for_account(
    pool: &PgPool,
    account_id: i32,
    name: Option<&str>,
) -> Result<Vec<Destination>> {
    match name {
        Some(name) => {
            sqlx::query_as::<_, Destination>(
                "SELECT * FROM destinations
                 WHERE account_id = $1 AND name = $2 AND is_active = TRUE ORDER BY id",
            )
            .bind(account_id)
            .bind(name)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Destination>(
                "SELECT * FROM destinations
                 WHERE account_id = $1 AND is_active = TRUE ORDER BY id",
            )
            .bind(account_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_owned_destination(
    pool: &PgPool,
    account_id: i32,
    destination_id: i32,
) -> Result<Option<Destination>> {
    sqlx::query_as::<_, Destination>(
        "SELECT * FROM destinations WHERE id = $1 AND account_id = $2",
    )
    .bind(destination_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

/// Updates an owned destination in place. Returns `None` when the row does
/// not exist or belongs to someone else.
pub async fn update_destination(
    pool: &PgPool,
    account_id: i32,
    destination_id: i32,
    name: &str,
    platform_type: &str,
    endpoint: &str,
    secret: Option<&str>,
    is_active: bool,
) -> Result<Option<Destination>> {
    sqlx::query_as::<_, Destination>(
        "UPDATE destinations
         SET name = $1, platform_type = $2, endpoint = $3, secret = $4, is_active = $5
         WHERE id = $6 AND account_id = $7 RETURNING *",
    )
    .bind(name)
    .bind(platform_type)
    .bind(endpoint)
    .bind(secret)
    .bind(is_active)
    .bind(destination_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_destination(
    pool: &PgPool,
    account_id: i32,
    destination_id: i32,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM destinations WHERE id = $1 AND account_id = $2")
        .bind(destination_id)
        .bind(account_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
