use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use super::{NotificationSender, http_client};
use crate::notifications::models::SendOutcome;

/// Sender for generic webhooks: the message is wrapped in a small JSON
/// envelope and POSTed to the configured URL.
pub struct WebhookSender {
    webhook_url: String,
}

impl WebhookSender {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct WebhookEnvelope<'a> {
    message: &'a str,
    timestamp: String,
    source: &'a str,
}

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let payload = WebhookEnvelope {
            message,
            timestamp: Utc::now().to_rfc3339(),
            source: "pushgate",
        };

        match http_client().post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => {
                let status = response.status().as_u16() as i32;
                let body = response.text().await.unwrap_or_default();
                let response_text = if body.is_empty() { "OK".to_string() } else { body };
                SendOutcome::new(matches!(status, 200 | 201 | 204), status, response_text)
            }
            Err(e) => SendOutcome::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_message_timestamp_and_source() {
        let payload = WebhookEnvelope {
            message: "hello",
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            source: "pushgate",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["message"], "hello");
        assert_eq!(json["source"], "pushgate");
        assert!(json["timestamp"].is_string());
    }
}
