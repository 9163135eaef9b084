//! SMS channel: Textfully HTTP API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::channels::{ChannelKind, OutreachChannel};
use crate::error::ChannelError;
use crate::record::LeadRecord;
use crate::templates::MessageTemplates;

/// SMS provider configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub api_key: SecretString,
    pub sender_id: String,
    pub base_url: String,
}

impl SmsConfig {
    /// Build config from environment variables.
    /// Returns `None` if `TEXTFULLY_API_KEY` is not set (channel disabled).
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("TEXTFULLY_API_KEY").ok()?;
        let sender_id =
            std::env::var("SMS_SENDER_ID").unwrap_or_else(|_| "Lead Outreach".to_string());
        let base_url = std::env::var("TEXTFULLY_BASE_URL")
            .unwrap_or_else(|_| "https://api.textfully.com".to_string());

        Some(Self {
            api_key: SecretString::from(api_key),
            sender_id,
            base_url,
        })
    }
}

/// Outreach over SMS. Normalizes the phone number and renders the short
/// template per record.
pub struct SmsChannel {
    config: SmsConfig,
    templates: MessageTemplates,
    client: reqwest::Client,
}

impl SmsChannel {
    pub fn new(config: SmsConfig, templates: MessageTemplates) -> Self {
        Self {
            config,
            templates,
            client: reqwest::Client::new(),
        }
    }

    async fn send_sms(&self, phone: &str, message: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "to": phone,
            "message": message,
            "from": self.config.sender_id,
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "sms".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "sms".into(),
                reason: format!("provider rejected send (status {status}): {err}"),
            });
        }

        tracing::info!("Outreach SMS sent to {phone}");
        Ok(())
    }
}

#[async_trait]
impl OutreachChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn applies_to(&self, record: &LeadRecord) -> bool {
        record
            .contact_number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }

    async fn attempt(&self, record: &LeadRecord) -> Result<(), ChannelError> {
        let raw = record
            .contact_number
            .as_deref()
            .ok_or_else(|| ChannelError::InvalidRecipient {
                name: "sms".into(),
                reason: "record has no contact number".into(),
            })?;
        let phone = normalize_phone(raw);
        let message = self.templates.render(&self.templates.sms_body, record);
        self.send_sms(&phone, &message).await
    }
}

/// Strip whitespace and ensure a leading international-dial prefix.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.starts_with('+') {
        digits
    } else {
        format!("+{digits}")
    }
}
