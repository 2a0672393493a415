use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::db::services::template_service;
use crate::web::models::{
    AuthenticatedAccount, CreateTemplateRequest, TemplateResponse, UpdateTemplateRequest,
};
use crate::web::{AppState, error::AppError};

const PUBLIC_LIST_LIMIT: i64 = 10;

fn variables_json(variables: Option<&Vec<String>>) -> Option<serde_json::Value> {
    variables.map(|names| serde_json::json!(names))
}

// GET /api/templates
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<serde_json::Value>, AppError> {
    let own = template_service::list_templates_for_account(&state.db_pool, account.id).await?;
    let public = template_service::list_public(&state.db_pool, PUBLIC_LIST_LIMIT).await?;

    let own: Vec<TemplateResponse> = own.iter().map(TemplateResponse::of).collect();
    let public: Vec<TemplateResponse> = public.iter().map(TemplateResponse::of).collect();
    Ok(Json(serde_json::json!({
        "templates": own,
        "public_templates": public,
    })))
}

// POST /api/templates
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), AppError> {
    if payload.name.is_empty() || payload.content.is_empty() {
        return Err(AppError::InvalidInput(
            "name and content are required".to_string(),
        ));
    }

    let variables = variables_json(payload.variables.as_ref());
    let template = template_service::create_template(
        &state.db_pool,
        account.id,
        &payload.name,
        payload.description.as_deref(),
        &payload.content,
        variables.as_ref(),
        payload.category.as_deref().unwrap_or("custom"),
        payload.is_public.unwrap_or(false),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::of(&template))))
}

// PUT /api/templates/{id}
pub async fn update_template(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(template_id): Path<i32>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let existing = template_service::get_owned_template(&state.db_pool, account.id, template_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let content = payload.content.unwrap_or(existing.content);
    let variables = variables_json(payload.variables.as_ref()).or(existing.variables);
    let category = payload.category.unwrap_or(existing.category);

    let updated = template_service::update_template(
        &state.db_pool,
        account.id,
        template_id,
        &name,
        description.as_deref(),
        &content,
        variables.as_ref(),
        &category,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(TemplateResponse::of(&updated)))
}

// DELETE /api/templates/{id}
pub async fn delete_template(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(template_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted =
        template_service::delete_template(&state.db_pool, account.id, template_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Template not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
