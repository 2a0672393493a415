use axum::{Extension, Json, extract::State, http::StatusCode};
use bcrypt::{DEFAULT_COST, hash};
use std::sync::Arc;

use crate::auth;
use crate::db::services::account_service;
use crate::web::models::{AuthenticatedAccount, RegisterRequest, RegisterResponse, TokenResponse};
use crate::web::{AppState, error::AppError};

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Username and email are required; password must be at least 8 characters".to_string(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(AppError::InvalidInput("Invalid email format".to_string()));
    }

    if account_service::find_by_username(&state.db_pool, &payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }
    if account_service::find_by_email(&state.db_pool, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {e}")))?;

    let account = account_service::create_account(
        &state.db_pool,
        &payload.username,
        &payload.email,
        &password_hash,
    )
    .await?;

    // Accounts are created with a ready-to-use credential so the first
    // dispatch does not need a separate issuance round-trip.
    let (token, expires_at) = auth::issue_token(&state.db_pool, &state.cache, account.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: account.id,
            username: account.username,
            email: account.email,
            api_token: token,
            token_expires_at: expires_at,
        }),
    ))
}

// POST /api/token/generate
pub async fn generate_token(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<TokenResponse>, AppError> {
    let (token, expires_at) = auth::issue_token(&state.db_pool, &state.cache, account.id).await?;
    Ok(Json(TokenResponse {
        success: true,
        token,
        expires_at,
    }))
}

// POST /api/token/revoke
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::revoke_token(&state.db_pool, &state.cache, account.id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "API token revoked",
    })))
}
