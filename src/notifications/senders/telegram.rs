use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotificationSender, SenderError, http_client};
use crate::notifications::models::SendOutcome;

/// Sender for the Telegram Bot API.
///
/// The connection descriptor is `bot_token:chat_id`. Bot tokens themselves
/// contain a colon (`123456:ABC-DEF...`), so the descriptor is split on the
/// last one.
pub struct TelegramSender {
    descriptor: String,
}

impl TelegramSender {
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
        }
    }
}

fn parse_descriptor(raw: &str) -> Result<(&str, &str), SenderError> {
    let (bot_token, chat_id) = raw.rsplit_once(':').ok_or_else(|| {
        SenderError::InvalidDescriptor("expected bot_token:chat_id".to_string())
    })?;
    if bot_token.is_empty() || chat_id.is_empty() {
        return Err(SenderError::InvalidDescriptor(
            "expected bot_token:chat_id".to_string(),
        ));
    }
    Ok((bot_token, chat_id))
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct TelegramReply {
    ok: bool,
    description: Option<String>,
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let (bot_token, chat_id) = match parse_descriptor(&self.descriptor) {
            Ok(parts) => parts,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let api_url = format!("https://api.telegram.org/bot{bot_token}/sendMessage");
        let payload = TelegramMessage {
            chat_id,
            text: message,
            parse_mode: "HTML",
        };

        let response = match http_client().post(&api_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let status = response.status().as_u16() as i32;
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TelegramReply>(&body) {
            Ok(reply) => SendOutcome::new(reply.ok, status, reply.description.unwrap_or(body)),
            Err(e) => SendOutcome::failure(format!("invalid platform response: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_descriptor_on_last_colon() {
        let (token, chat) = parse_descriptor("123456:ABC-DEF:-1001234").unwrap();
        assert_eq!(token, "123456:ABC-DEF");
        assert_eq!(chat, "-1001234");
    }

    #[test]
    fn plain_token_and_chat_id() {
        let (token, chat) = parse_descriptor("bottoken:42").unwrap();
        assert_eq!(token, "bottoken");
        assert_eq!(chat, "42");
    }

    #[test]
    fn descriptor_without_chat_id_is_rejected() {
        assert!(parse_descriptor("bottoken").is_err());
        assert!(parse_descriptor("bottoken:").is_err());
        assert!(parse_descriptor(":42").is_err());
    }

    #[tokio::test]
    async fn send_fails_fast_on_bad_descriptor() {
        let outcome = TelegramSender::new("no-chat-id-here").send("hello").await;
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, 0);
        assert!(outcome.response.contains("bot_token:chat_id"));
    }
}
