use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use super::{NotificationSender, SenderError};
use crate::notifications::models::SendOutcome;

/// Sender that delivers the message as an email over SMTPS.
///
/// The connection descriptor is `host:port:username:password:recipient`.
/// The first four fields are fixed; the remainder is the recipient, which
/// may itself contain colons.
pub struct EmailSender {
    descriptor: String,
}

impl EmailSender {
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct SmtpEndpoint {
    host: String,
    port: u16,
    username: String,
    password: String,
    recipient: String,
}

fn parse_descriptor(raw: &str) -> Result<SmtpEndpoint, SenderError> {
    let parts: Vec<&str> = raw.splitn(5, ':').collect();
    if parts.len() < 5 {
        return Err(SenderError::InvalidDescriptor(
            "expected host:port:username:password:recipient".to_string(),
        ));
    }
    let port = parts[1]
        .parse::<u16>()
        .map_err(|_| SenderError::InvalidDescriptor(format!("invalid port: {}", parts[1])))?;
    Ok(SmtpEndpoint {
        host: parts[0].to_string(),
        port,
        username: parts[2].to_string(),
        password: parts[3].to_string(),
        recipient: parts[4].to_string(),
    })
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(&self, message: &str) -> SendOutcome {
        let endpoint = match parse_descriptor(&self.descriptor) {
            Ok(endpoint) => endpoint,
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let from: Mailbox = match endpoint.username.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return SendOutcome::failure(format!("invalid sender address: {e}")),
        };
        let to: Mailbox = match endpoint.recipient.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return SendOutcome::failure(format!("invalid recipient address: {e}")),
        };

        let email = match Message::builder()
            .from(from)
            .to(to)
            .subject("通知消息")
            .body(message.to_string())
        {
            Ok(email) => email,
            Err(e) => return SendOutcome::failure(format!("failed to build email: {e}")),
        };

        let mailer = match SmtpTransport::relay(&endpoint.host) {
            Ok(builder) => builder
                .port(endpoint.port)
                .credentials(Credentials::new(endpoint.username, endpoint.password))
                .build(),
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        // lettre's SMTP transport is blocking: connect, authenticate, send,
        // disconnect in one synchronous sequence off the async runtime.
        let result = tokio::task::spawn_blocking(move || mailer.send(&email)).await;
        match result {
            Ok(Ok(_)) => SendOutcome::new(true, 200, "email sent"),
            Ok(Err(e)) => SendOutcome::failure(e.to_string()),
            Err(e) => SendOutcome::failure(format!("send task failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_five_field_descriptor() {
        let endpoint =
            parse_descriptor("smtp.example.com:465:bot@example.com:s3cret:to@example.com").unwrap();
        assert_eq!(
            endpoint,
            SmtpEndpoint {
                host: "smtp.example.com".to_string(),
                port: 465,
                username: "bot@example.com".to_string(),
                password: "s3cret".to_string(),
                recipient: "to@example.com".to_string(),
            }
        );
    }

    #[test]
    fn recipient_may_contain_colons() {
        let endpoint = parse_descriptor("smtp.example.com:465:u:p:odd:recipient").unwrap();
        assert_eq!(endpoint.recipient, "odd:recipient");
    }

    #[test]
    fn too_few_fields_are_rejected() {
        assert!(parse_descriptor("smtp.example.com:465:u:p").is_err());
        assert!(parse_descriptor("smtp.example.com").is_err());
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert!(parse_descriptor("smtp.example.com:ssl:u:p:to@example.com").is_err());
    }

    #[tokio::test]
    async fn send_fails_fast_on_bad_descriptor() {
        let outcome = EmailSender::new("smtp.example.com:465").send("hello").await;
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, 0);
        assert!(outcome.response.contains("host:port:username:password:recipient"));
    }
}
