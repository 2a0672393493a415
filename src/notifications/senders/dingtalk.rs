use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{NotificationSender, http_client};
use crate::notifications::models::SendOutcome;

type HmacSha256 = Hmac<Sha256>;

/// Sender for DingTalk group-robot webhooks.
///
/// When the robot is configured with a signing secret, each request URL
/// carries `timestamp` (epoch milliseconds) and `sign` query parameters,
/// where the signature is HMAC-SHA256 over `"{timestamp}\n{secret}"`,
/// base64-encoded and then percent-encoded. Without a secret the URL is
/// used as-is.
pub struct DingTalkSender {
    webhook_url: String,
    secret: Option<String>,
    at_mobiles: Vec<String>,
    at_all: bool,
}

impl DingTalkSender {
    pub fn new(webhook_url: &str, secret: Option<&str>) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
            secret: secret.map(|s| s.to_string()),
            at_mobiles: Vec::new(),
            at_all: false,
        }
    }

    /// Extends the payload with DingTalk's `@` mention block: specific
    /// mobile numbers, or everyone in the group.
    pub fn with_mentions(mut self, at_mobiles: Vec<String>, at_all: bool) -> Self {
        self.at_mobiles = at_mobiles;
        self.at_all = at_all;
        self
    }

    fn sign(&self, timestamp: &str) -> Option<String> {
        let secret = self.secret.as_deref()?;
        let string_to_sign = format!("{timestamp}\n{secret}");
        // An HMAC key of any length is accepted, so this cannot fail.
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(string_to_sign.as_bytes());
        let encoded = STANDARD.encode(mac.finalize().into_bytes());
        Some(urlencoding::encode(&encoded).into_owned())
    }

    /// DingTalk webhook URLs always carry `?access_token=`, so the signing
    /// parameters are appended with `&`.
    fn signed_url(&self, timestamp: &str) -> String {
        match self.sign(timestamp) {
            Some(sign) => format!("{}&timestamp={timestamp}&sign={sign}", self.webhook_url),
            None => self.webhook_url.clone(),
        }
    }
}

#[derive(Serialize)]
struct DingTalkText<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct DingTalkAt<'a> {
    #[serde(rename = "atMobiles")]
    at_mobiles: &'a [String],
    #[serde(rename = "isAtAll")]
    is_at_all: bool,
}

#[derive(Serialize)]
struct DingTalkMessage<'a> {
    msgtype: &'a str,
    text: DingTalkText<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    at: Option<DingTalkAt<'a>>,
}

#[derive(Deserialize)]
struct DingTalkReply {
    errcode: i64,
    errmsg: Option<String>,
}

#[async_trait]
impl NotificationSender for DingTalkSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let url = self.signed_url(&timestamp);

        let at = (self.at_all || !self.at_mobiles.is_empty()).then_some(DingTalkAt {
            at_mobiles: &self.at_mobiles,
            is_at_all: self.at_all,
        });
        let payload = DingTalkMessage {
            msgtype: "text",
            text: DingTalkText { content: message },
            at,
        };

        let response = match http_client().post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let status = response.status().as_u16() as i32;
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<DingTalkReply>(&body) {
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
    fn signature_matches_reference_value() {
        // Independently computed: HMAC-SHA256("1700000000000\ntest-secret",
        // key "test-secret") -> base64 -> percent-encode.
        let sender = DingTalkSender::new(
            "https://oapi.dingtalk.com/robot/send?access_token=abc",
            Some("test-secret"),
        );
        assert_eq!(
            sender.sign("1700000000000").unwrap(),
            "BYMqUCZnSqbfPf1GCfZftO7Rg2g6P%2BRp3%2F4%2BbLNtSGA%3D"
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let sender = DingTalkSender::new("https://example.com?access_token=x", Some("SEC000abc"));
        let first = sender.sign("1609459200000").unwrap();
        let second = sender.sign("1609459200000").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "QANN3dV5cm7iTfx7EJrnUARHrstfRC7mYM%2Bgprupj5I%3D");
    }

    #[test]
    fn signed_url_appends_timestamp_and_sign() {
        let sender = DingTalkSender::new(
            "https://oapi.dingtalk.com/robot/send?access_token=abc",
            Some("test-secret"),
        );
        let url = sender.signed_url("1700000000000");
        assert!(url.starts_with("https://oapi.dingtalk.com/robot/send?access_token=abc&timestamp=1700000000000&sign="));
    }

    #[test]
    fn missing_secret_skips_signing() {
        let sender = DingTalkSender::new("https://example.com?access_token=x", None);
        assert!(sender.sign("1700000000000").is_none());
        assert_eq!(
            sender.signed_url("1700000000000"),
            "https://example.com?access_token=x"
        );
    }

    #[test]
    fn mention_block_is_only_serialized_when_requested() {
        let plain = DingTalkMessage {
            msgtype: "text",
            text: DingTalkText { content: "hi" },
            at: None,
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("at").is_none());

        let mobiles = vec!["13800000000".to_string()];
        let mentioned = DingTalkMessage {
            msgtype: "text",
            text: DingTalkText { content: "hi" },
            at: Some(DingTalkAt {
                at_mobiles: &mobiles,
                is_at_all: false,
            }),
        };
        let json = serde_json::to_value(&mentioned).unwrap();
        assert_eq!(
            json["at"],
            serde_json::json!({"atMobiles": ["13800000000"], "isAtAll": false})
        );
    }
}
