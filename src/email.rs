use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::EmailConfig;
use crate::error::{NudgeError, Result};
use crate::interfaces::mailer::Mailer;

/// SMTP-backed mailer. Every message goes to the deployment-configured
/// recipient.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NudgeError::Config(e.to_string()))?;
        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from
            .parse()
            .map_err(|e| NudgeError::Config(format!("invalid from address: {e}")))?;
        let to = config
            .to
            .parse()
            .map_err(|e| NudgeError::Config(format!("invalid to address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NudgeError::Delivery(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NudgeError::Delivery(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::SmtpMailer;
    use crate::config::EmailConfig;
    use crate::error::NudgeError;

    fn base_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: Some(587),
            username: Some("nudge".to_string()),
            password: Some("secret".to_string()),
            from: "nudge@example.com".to_string(),
            to: "me@example.com".to_string(),
        }
    }

    #[test]
    fn builds_transport_from_valid_config() {
        assert!(SmtpMailer::from_config(&base_config()).is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        let mut config = base_config();
        config.to = "not-an-address".to_string();
        let err = SmtpMailer::from_config(&config).unwrap_err();
        assert!(matches!(err, NudgeError::Config(_)));
    }
}
