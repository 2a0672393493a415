use chrono::Utc;
use sqlx::{PgExecutor, PgPool, Result};

use crate::db::models::MessageTemplate;

/// Suffix appended to a public template's name when it is copied into the
/// caller's account; also how a prior copy is detected.
pub const COPY_SUFFIX: &str = " (复制)";

// --- Template Service Functions ---

#[allow(clippy::too_many_arguments)]
pub async fn create_template(
    pool: &PgPool,
    account_id: i32,
    name: &str,
    description: Option<&str>,
    content: &str,
    variables: Option<&serde_json::Value>,
    category: &str,
    is_public: bool,
) -> Result<MessageTemplate> {
    let now = Utc::now();
    sqlx::query_as::<_, MessageTemplate>(
        "INSERT INTO message_templates
           (account_id, name, description, content, variables, category, is_public, usage_count, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $8) RETURNING *",
    )
    .bind(account_id)
    .bind(name)
    .bind(description)
    .bind(content)
    .bind(variables)
    .bind(category)
    .bind(is_public)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_template(pool: &PgPool, template_id: i32) -> Result<Option<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>("SELECT * FROM message_templates WHERE id = $1")
        .bind(template_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_owned_template(
    pool: &PgPool,
    account_id: i32,
    template_id: i32,
) -> Result<Option<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "SELECT * FROM message_templates WHERE id = $1 AND account_id = $2",
    )
    .bind(template_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

/// A public template, fetched for cross-account use or copying.
pub async fn get_public(pool: &PgPool, template_id: i32) -> Result<Option<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "SELECT * FROM message_templates WHERE id = $1 AND is_public = TRUE",
    )
    .bind(template_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_templates_for_account(pool: &PgPool, account_id: i32) -> Result<Vec<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "SELECT * FROM message_templates WHERE account_id = $1 ORDER BY id",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
}

pub async fn list_public(pool: &PgPool, limit: i64) -> Result<Vec<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "SELECT * FROM message_templates WHERE is_public = TRUE ORDER BY id LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn find_by_name(
    pool: &PgPool,
    account_id: i32,
    name: &str,
) -> Result<Option<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "SELECT * FROM message_templates WHERE account_id = $1 AND name = $2",
    )
    .bind(account_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_template(
    pool: &PgPool,
    account_id: i32,
    template_id: i32,
    name: &str,
    description: Option<&str>,
    content: &str,
    variables: Option<&serde_json::Value>,
    category: &str,
) -> Result<Option<MessageTemplate>> {
    sqlx::query_as::<_, MessageTemplate>(
        "UPDATE message_templates
         SET name = $1, description = $2, content = $3, variables = $4, category = $5, updated_at = $6
         WHERE id = $7 AND account_id = $8 RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(content)
    .bind(variables)
    .bind(category)
    .bind(Utc::now())
    .bind(template_id)
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_template(pool: &PgPool, account_id: i32, template_id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM message_templates WHERE id = $1 AND account_id = $2")
        .bind(template_id)
        .bind(account_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Duplicates a public template into `account_id` as a private, independent
/// copy named `"<name> (复制)"`.
pub async fn copy_template(
    pool: &PgPool,
    account_id: i32,
    source: &MessageTemplate,
) -> Result<MessageTemplate> {
    create_template(
        pool,
        account_id,
        &format!("{}{}", source.name, COPY_SUFFIX),
        source.description.as_deref(),
        &source.content,
        source.variables.as_ref(),
        &source.category,
        false,
    )
    .await
}

/// Bumps the usage counter. Runs on the dispatch transaction so the counter
/// commits atomically with the delivery records of the same dispatch.
pub async fn increment_usage<'e, E: PgExecutor<'e>>(executor: E, template_id: i32) -> Result<()> {
    sqlx::query(
        "UPDATE message_templates SET usage_count = usage_count + 1, updated_at = $1 WHERE id = $2",
    )
    .bind(Utc::now())
    .bind(template_id)
    .execute(executor)
    .await?;
    Ok(())
}
