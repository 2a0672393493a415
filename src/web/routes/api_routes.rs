use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{self, AccountSnapshot};
use crate::cache;
use crate::db::services::delivery_service::{self, AccountStats};
use crate::db::services::template_service;
use crate::notifications::template;
use crate::web::middleware::auth::bearer_token;
use crate::web::models::{
    AuthenticatedAccount, RecentLogEntry, RecentLogsResponse, SendRequest, SendResponse,
    SendTemplateRequest, SendTemplateResponse, TemplateResponse,
};
use crate::web::{AppState, error::AppError};

const STATS_TTL: Duration = Duration::from_secs(5 * 60);
const RECENT_LOGS_LIMIT: i64 = 10;

/// Resolves the caller on the dispatch endpoints, which accept the token in
/// the `Authorization` header or (for compatibility) a body field. The
/// header wins when both are present.
async fn account_from_request(
    state: &AppState,
    headers: &HeaderMap,
    body_token: Option<&str>,
) -> Result<AccountSnapshot, AppError> {
    let token = bearer_token(headers)
        .or_else(|| body_token.map(|t| t.to_string()))
        .ok_or_else(|| AppError::Unauthorized("Missing API token".to_string()))?;

    auth::authenticate(&state.db_pool, &state.cache, &token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired API token".to_string()))
}

// POST /api/send
pub async fn send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let message = payload
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing required field: message".to_string()))?;

    let account = account_from_request(&state, &headers, payload.token.as_deref()).await?;

    let report = state
        .dispatch
        .dispatch(account.id, message, payload.platform.as_deref(), None)
        .await?;

    Ok(Json(SendResponse {
        message: "Notification dispatch completed".to_string(),
        results: report.results,
    }))
}

// POST /api/send_template
pub async fn send_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SendTemplateRequest>,
) -> Result<Json<SendTemplateResponse>, AppError> {
    let template_id = payload.template_id.ok_or_else(|| {
        AppError::InvalidInput("Missing required field: template_id".to_string())
    })?;

    let account = account_from_request(&state, &headers, payload.token.as_deref()).await?;

    let tpl = template_service::get_template(&state.db_pool, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    if !tpl.usable_by(account.id) {
        return Err(AppError::PermissionDenied(
            "No permission to use this template".to_string(),
        ));
    }

    let variables = payload.variables.unwrap_or_else(HashMap::new);
    let rendered = template::render(&tpl.content, &variables);

    let report = state
        .dispatch
        .dispatch(account.id, &rendered, payload.platform.as_deref(), Some(&tpl))
        .await?;

    Ok(Json(SendTemplateResponse {
        message: "Template dispatch completed".to_string(),
        template: tpl.name,
        results: report.results,
    }))
}

// GET /api/template/{id}
pub async fn get_template_meta(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(template_id): Path<i32>,
) -> Result<Json<TemplateResponse>, AppError> {
    let tpl = template_service::get_owned_template(&state.db_pool, account.id, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(TemplateResponse::of(&tpl)))
}

// POST /api/copy_template/{id}
pub async fn copy_template(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(template_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let source = template_service::get_public(&state.db_pool, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Public template not found".to_string()))?;

    let copy_name = format!("{}{}", source.name, template_service::COPY_SUFFIX);
    if template_service::find_by_name(&state.db_pool, account.id, &copy_name)
        .await?
        .is_some()
    {
        return Err(AppError::InvalidInput(
            "Template already copied".to_string(),
        ));
    }

    let copy = template_service::copy_template(&state.db_pool, account.id, &source).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Template copied",
        "id": copy.id,
    })))
}

// GET /api/recent_logs
pub async fn recent_logs(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<RecentLogsResponse>, AppError> {
    let records =
        delivery_service::recent_for_account(&state.db_pool, account.id, RECENT_LOGS_LIMIT)
            .await?;
    let logs = records
        .into_iter()
        .map(|record| RecentLogEntry {
            id: record.id,
            message: record.message,
            status: record.status,
            error_message: record.error_message,
            sent_at: record.sent_at.format("%m-%d %H:%M").to_string(),
        })
        .collect();
    Ok(Json(RecentLogsResponse { logs }))
}

// GET /api/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<AccountStats>, AppError> {
    let key = cache::stats_key(account.id);
    if let Some(stats) = state.cache.get_json::<AccountStats>(&key) {
        return Ok(Json(stats));
    }

    let stats = delivery_service::stats_for_account(&state.db_pool, account.id).await?;
    state.cache.set_json(&key, &stats, STATS_TTL);
    Ok(Json(stats))
}
