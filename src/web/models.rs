use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::notifications::models::DestinationOutcome;

/// The authenticated caller, attached to the request by the auth middleware
/// (or resolved in-handler on the token-in-body compatibility paths).
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub id: i32,
    pub username: String,
}

// --- auth / account ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub api_token: String,
    pub token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// --- dispatch ---

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: Option<String>,
    /// Destination name filter; all active destinations when absent.
    pub platform: Option<String>,
    /// Body-token compatibility path; `Authorization: Bearer` wins.
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message: String,
    pub results: Vec<DestinationOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    pub template_id: Option<i32>,
    pub variables: Option<HashMap<String, String>>,
    pub platform: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendTemplateResponse {
    pub message: String,
    pub template: String,
    pub results: Vec<DestinationOutcome>,
}

// --- destinations ---

#[derive(Debug, Deserialize)]
pub struct CreateDestinationRequest {
    pub name: String,
    pub platform_type: String,
    pub endpoint: String,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDestinationRequest {
    pub name: Option<String>,
    pub platform_type: Option<String>,
    pub endpoint: Option<String>,
    pub secret: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TestDestinationRequest {
    pub message: Option<String>,
}

// --- templates ---

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub variables: Option<Vec<String>>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub variables: Option<Vec<String>>,
    pub category: Option<String>,
}

/// Template metadata as returned to its owner; excludes nothing sensitive
/// but keeps the wire shape independent of the DB row.
#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub variables: Vec<String>,
    pub category: String,
    pub is_public: bool,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl TemplateResponse {
    pub fn of(template: &crate::db::models::MessageTemplate) -> Self {
        let variables = template
            .variables
            .as_ref()
            .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
            .unwrap_or_default();
        Self {
            id: template.id,
            name: template.name.clone(),
            description: template.description.clone(),
            content: template.content.clone(),
            variables,
            category: template.category.clone(),
            is_public: template.is_public,
            usage_count: template.usage_count,
            created_at: template.created_at,
        }
    }
}

// --- logs ---

#[derive(Debug, Serialize)]
pub struct RecentLogEntry {
    pub id: i32,
    pub message: String,
    pub status: String,
    pub error_message: Option<String>,
    pub sent_at: String,
}

#[derive(Debug, Serialize)]
pub struct RecentLogsResponse {
    pub logs: Vec<RecentLogEntry>,
}
