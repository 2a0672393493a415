use async_trait::async_trait;
use serde::Serialize;

use super::{NotificationSender, http_client};
use crate::notifications::models::SendOutcome;

/// Sender for flomo memo webhooks.
pub struct FlomoSender {
    webhook_url: String,
}

impl FlomoSender {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct FlomoMessage<'a> {
    content: &'a str,
}

#[async_trait]
impl NotificationSender for FlomoSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let payload = FlomoMessage { content: message };

        match http_client().post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => {
                let status = response.status().as_u16() as i32;
                let body = response.text().await.unwrap_or_default();
                SendOutcome::new(status == 200, status, body)
            }
            Err(e) => SendOutcome::failure(e.to_string()),
        }
    }
}
