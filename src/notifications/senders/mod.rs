use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::db::models::Destination;
use crate::notifications::models::SendOutcome;

pub mod dingtalk;
pub mod email;
pub mod feishu;
pub mod flomo;
pub mod telegram;
pub mod webhook;
pub mod wework;

use dingtalk::DingTalkSender;
use email::EmailSender;
use feishu::FeishuSender;
use flomo::FlomoSender;
use telegram::TelegramSender;
use webhook::WebhookSender;
use wework::WeworkSender;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),
}

/// Shared HTTP client for all webhook-style senders. The connect/read
/// timeout bounds how long one slow destination can stall a dispatch.
pub(crate) fn http_client() -> &'static Client {
    static CLIENT: Lazy<Client> = Lazy::new(|| {
        Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new())
    });
    &CLIENT
}

/// A capability for delivering one message to one destination type.
///
/// Implementations never return errors: every failure mode (network error,
/// bad descriptor, platform rejection) is folded into the [`SendOutcome`]
/// so the dispatcher can treat all destinations uniformly.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &str) -> SendOutcome;
}

/// Maps a destination's lower-cased platform type to the sender able to
/// handle it. Unknown types yield `None`, not an error; callers skip the
/// destination as if it were inactive.
pub fn resolve(destination: &Destination) -> Option<Box<dyn NotificationSender>> {
    match destination.platform_type.to_lowercase().as_str() {
        "feishu" => Some(Box::new(FeishuSender::new(&destination.endpoint))),
        "flomo" => Some(Box::new(FlomoSender::new(&destination.endpoint))),
        "dingtalk" => Some(Box::new(DingTalkSender::new(
            &destination.endpoint,
            destination.secret.as_deref(),
        ))),
        "wework" => Some(Box::new(WeworkSender::new(&destination.endpoint))),
        "telegram" => Some(Box::new(TelegramSender::new(&destination.endpoint))),
        "email" => Some(Box::new(EmailSender::new(&destination.endpoint))),
        "webhook" => Some(Box::new(WebhookSender::new(&destination.endpoint))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn destination(platform_type: &str) -> Destination {
        Destination {
            id: 1,
            account_id: 1,
            name: "chat1".to_string(),
            platform_type: platform_type.to_string(),
            endpoint: "https://example.com/hook".to_string(),
            secret: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolves_every_supported_platform() {
        for platform in ["feishu", "flomo", "dingtalk", "wework", "telegram", "email", "webhook"] {
            assert!(resolve(&destination(platform)).is_some(), "{platform}");
        }
    }

    #[test]
    fn platform_type_is_case_insensitive() {
        assert!(resolve(&destination("Feishu")).is_some());
        assert!(resolve(&destination("TELEGRAM")).is_some());
    }

    #[test]
    fn unknown_platform_resolves_to_none() {
        assert!(resolve(&destination("pager")).is_none());
        assert!(resolve(&destination("")).is_none());
    }
}
