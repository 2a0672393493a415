use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::db::models::Destination;
use crate::db::services::destination_service;
use crate::notifications::models::SendOutcome;
use crate::web::models::{
    AuthenticatedAccount, CreateDestinationRequest, TestDestinationRequest,
    UpdateDestinationRequest,
};
use crate::web::{AppState, error::AppError};

// GET /api/destinations
pub async fn list_destinations(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<Vec<Destination>>, AppError> {
    let destinations =
        destination_service::list_destinations_for_account(&state.db_pool, account.id).await?;
    Ok(Json(destinations))
}

// POST /api/destinations
pub async fn create_destination(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Json(payload): Json<CreateDestinationRequest>,
) -> Result<(StatusCode, Json<Destination>), AppError> {
    if payload.name.is_empty() || payload.platform_type.is_empty() || payload.endpoint.is_empty() {
        return Err(AppError::InvalidInput(
            "name, platform_type and endpoint are required".to_string(),
        ));
    }

    let destination = destination_service::create_destination(
        &state.db_pool,
        account.id,
        &payload.name,
        &payload.platform_type,
        &payload.endpoint,
        payload.secret.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(destination)))
}

// PUT /api/destinations/{id}
pub async fn update_destination(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(destination_id): Path<i32>,
    Json(payload): Json<UpdateDestinationRequest>,
) -> Result<Json<Destination>, AppError> {
    let existing = destination_service::get_owned_destination(&state.db_pool, account.id, destination_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Destination not found".to_string()))?;

    let name = payload.name.unwrap_or(existing.name);
    let platform_type = payload.platform_type.unwrap_or(existing.platform_type);
    let endpoint = payload.endpoint.unwrap_or(existing.endpoint);
    let secret = payload.secret.or(existing.secret);
    let is_active = payload.is_active.unwrap_or(existing.is_active);

    let updated = destination_service::update_destination(
        &state.db_pool,
        account.id,
        destination_id,
        &name,
        &platform_type,
        &endpoint,
        secret.as_deref(),
        is_active,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Destination not found".to_string()))?;
    Ok(Json(updated))
}

// DELETE /api/destinations/{id}
pub async fn delete_destination(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(destination_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted =
        destination_service::delete_destination(&state.db_pool, account.id, destination_id)
            .await?;
    if !deleted {
        return Err(AppError::NotFound("Destination not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/destinations/{id}/test
pub async fn test_destination(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
    Path(destination_id): Path<i32>,
    Json(payload): Json<TestDestinationRequest>,
) -> Result<Json<SendOutcome>, AppError> {
    let outcome = state
        .dispatch
        .test_destination(account.id, destination_id, payload.message)
        .await?;
    Ok(Json(outcome))
}
