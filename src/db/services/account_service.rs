use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};

use crate::db::models::Account;

// --- Account Service Functions ---

/// Creates a new account. The API token starts out unset; the caller issues
/// one separately.
pub async fn create_account(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (username, email, password_hash, is_active, created_at)
         VALUES ($1, $2, $3, TRUE, $4) RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, account_id: i32) -> Result<Option<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
        .bind(account_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Looks an account up by its API token. Validity (expiry, active flag) is
/// the caller's concern; this is a plain store lookup.
pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Account>> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE api_token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Stores a freshly issued token and its expiry on the account row.
pub async fn store_token(
    pool: &PgPool,
    account_id: i32,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE accounts SET api_token = $1, token_expires_at = $2 WHERE id = $3")
        .bind(token)
        .bind(expires_at)
        .bind(account_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Clears the credential without touching the account itself.
pub async fn clear_token(pool: &PgPool, account_id: i32) -> Result<()> {
    sqlx::query("UPDATE accounts SET api_token = NULL, token_expires_at = NULL WHERE id = $1")
        .bind(account_id)
        .execute(pool)
        .await?;
    Ok(())
}
