use async_trait::async_trait;
use serde::Serialize;

use super::{NotificationSender, http_client};
use crate::notifications::models::SendOutcome;

/// Sender for Feishu custom-bot webhooks.
pub struct FeishuSender {
    webhook_url: String,
}

impl FeishuSender {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct FeishuContent<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct FeishuMessage<'a> {
    msg_type: &'a str,
    content: FeishuContent<'a>,
}

#[async_trait]
impl NotificationSender for FeishuSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let payload = FeishuMessage {
            msg_type: "text",
            content: FeishuContent { text: message },
        };

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape_matches_platform_contract() {
        let payload = FeishuMessage {
            msg_type: "text",
            content: FeishuContent { text: "hello" },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"msg_type": "text", "content": {"text": "hello"}})
        );
    }
}
