use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account that owns destinations and templates.
/// Corresponds to the `accounts` table.
///
/// `api_token` is an opaque bearer credential with an explicit expiry; the
/// credential is valid iff it is present, unexpired, and the account is
/// active. Issuing or revoking the token never touches the rest of the row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub api_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A configured outbound notification endpoint.
/// Corresponds to the `destinations` table.
///
/// `endpoint` is an opaque connection descriptor whose format depends on
/// `platform_type` (a bare webhook URL, `bot_token:chat_id`,
/// `host:port:user:pass:recipient`, ...). `secret` only applies to signed
/// webhook platforms. Dispatch-by-name filters by owner + name, so names
/// need not be unique across accounts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Destination {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub platform_type: String,
    pub endpoint: String,
    pub secret: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A reusable message template with `{{variable}}` placeholders.
/// Corresponds to the `message_templates` table.
///
/// A private template is usable only by its owner; a public template is
/// usable (but not mutable) by any account and may be copied into the
/// caller's account as an independent template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageTemplate {
    pub id: i32,
    pub account_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    /// JSON array of declared variable names, e.g. `["host", "status"]`.
    pub variables: Option<serde_json::Value>,
    pub category: String,
    pub is_public: bool,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One audited send attempt. Corresponds to the `delivery_records` table.
///
/// Rows are immutable after insertion. `response_code` is the transport
/// status code, 0 when the attempt never reached the network.
/// `error_message` is only set for failures and is truncated before
/// persistence. All records of a single dispatch call share a `batch_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryRecord {
    pub id: i32,
    pub account_id: i32,
    pub destination_id: i32,
    pub message: String,
    pub status: String,
    pub response_code: Option<i32>,
    pub error_message: Option<String>,
    pub template_id: Option<i32>,
    pub batch_id: String,
    pub sent_at: DateTime<Utc>,
}

impl MessageTemplate {
    /// A template is usable by an account when the account owns it or the
    /// template is public. Mutation additionally requires ownership.
    pub fn usable_by(&self, account_id: i32) -> bool {
        self.account_id == account_id || self.is_public
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(owner: i32, public: bool) -> MessageTemplate {
        MessageTemplate {
            id: 1,
            account_id: owner,
            name: "deploy".to_string(),
            description: None,
            content: "{{service}} deployed".to_string(),
            variables: None,
            category: "custom".to_string(),
            is_public: public,
            usage_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn private_template_only_usable_by_owner() {
        let t = template(7, false);
        assert!(t.usable_by(7));
        assert!(!t.usable_by(8));
    }

    #[test]
    fn public_template_usable_by_anyone() {
        let t = template(7, true);
        assert!(t.usable_by(7));
        assert!(t.usable_by(8));
    }
}
