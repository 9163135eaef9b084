//! Email channel: outbound SMTP via lettre.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{ChannelKind, OutreachChannel};
use crate::error::ChannelError;
use crate::record::LeadRecord;
use crate::templates::MessageTemplates;

/// SMTP configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (channel disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from_address = std::env::var("FROM_EMAIL").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_address,
        })
    }
}

/// Outreach over SMTP. Renders the subject and body templates per record.
pub struct EmailChannel {
    config: SmtpConfig,
    templates: MessageTemplates,
}

impl EmailChannel {
    pub fn new(config: SmtpConfig, templates: MessageTemplates) -> Self {
        Self { config, templates }
    }

    fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| ChannelError::SendFailed {
                name: "email".into(),
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(self.config.port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(self.config.from_address.parse().map_err(|e| {
                ChannelError::InvalidRecipient {
                    name: "email".into(),
                    reason: format!("Invalid from address: {e}"),
                }
            })?)
            .to(to.parse().map_err(|e| ChannelError::InvalidRecipient {
                name: "email".into(),
                reason: format!("Invalid to address: {e}"),
            })?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| ChannelError::SendFailed {
                name: "email".into(),
                reason: format!("Failed to build email: {e}"),
            })?;

        transport.send(&email).map_err(|e| ChannelError::SendFailed {
            name: "email".into(),
            reason: format!("SMTP send failed: {e}"),
        })?;

        tracing::info!("Outreach email sent to {to}");
        Ok(())
    }
}

#[async_trait]
impl OutreachChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    fn applies_to(&self, record: &LeadRecord) -> bool {
        !record.contact_email.trim().is_empty()
    }

    async fn attempt(&self, record: &LeadRecord) -> Result<(), ChannelError> {
        let subject = self.templates.render(&self.templates.email_subject, record);
        let body = self.templates.render(&self.templates.email_body, record);
        self.send_email(record.contact_email.trim(), &subject, &body)
    }
}
