use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth;
use crate::web::models::AuthenticatedAccount;
use crate::web::{AppState, error::AppError};

/// Extracts the bearer token from a request's headers.
pub fn bearer_token(req_headers: &axum::http::HeaderMap) -> Option<String> {
    req_headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Token-auth middleware for all API routes that do not need the
/// token-in-body compatibility path. Resolves the credential through the
/// cache-backed authenticator and attaches the account to the request.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing API token".to_string()))?;

    let account = auth::authenticate(&state.db_pool, &state.cache, &token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired API token".to_string()))?;

    req.extensions_mut().insert(AuthenticatedAccount {
        id: account.id,
        username: account.username,
    });
    Ok(next.run(req).await)
}
