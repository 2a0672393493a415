use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotificationSender, http_client};
use crate::notifications::models::SendOutcome;

/// Sender for WeCom (企业微信) group-robot webhooks.
pub struct WeworkSender {
    webhook_url: String,
}

impl WeworkSender {
    pub fn new(webhook_url: &str) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
        }
    }
}

#[derive(Serialize)]
struct WeworkText<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct WeworkMessage<'a> {
    msgtype: &'a str,
    text: WeworkText<'a>,
}

#[derive(Deserialize)]
struct WeworkReply {
    errcode: i64,
    errmsg: Option<String>,
}

#[async_trait]
impl NotificationSender for WeworkSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let payload = WeworkMessage {
            msgtype: "text",
            text: WeworkText { content: message },
        };

        let response = match http_client().post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        // WeCom reports failures in an application-level errcode even on
        // HTTP 200, so success is judged on the body, not the status line.
        let status = response.status().as_u16() as i32;
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<WeworkReply>(&body) {
            Ok(reply) => SendOutcome::new(
                reply.errcode == 0,
                status,
                reply.errmsg.unwrap_or(body),
            ),
            Err(e) => SendOutcome::failure(format!("invalid platform response: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape_matches_platform_contract() {
        let payload = WeworkMessage {
            msgtype: "text",
            text: WeworkText { content: "hello" },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"msgtype": "text", "text": {"content": "hello"}})
        );
    }

    #[test]
    fn zero_errcode_means_success() {
        let reply: WeworkReply = serde_json::from_str(r#"{"errcode":0,"errmsg":"ok"}"#).unwrap();
        assert_eq!(reply.errcode, 0);
        let reply: WeworkReply =
            serde_json::from_str(r#"{"errcode":93000,"errmsg":"invalid webhook url"}"#).unwrap();
        assert_ne!(reply.errcode, 0);
    }
}
