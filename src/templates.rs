//! Outreach message templates and placeholder rendering.

use crate::record::LeadRecord;

/// Default email subject.
const DEFAULT_EMAIL_SUBJECT: &str = "Quick question for {company}";

/// Default email body.
const DEFAULT_EMAIL_BODY: &str = "Hi {name},\n\n\
I noticed {company} is doing great work in {industry}. I'd love to connect \
and discuss how we might help you {value_proposition}.\n\n\
Would you be open to a quick chat?\n\n\
Best regards,\n{sender_name}";

/// Default SMS body.
const DEFAULT_SMS_BODY: &str = "Hi {name}, I'm {sender_name} from {company}. \
Would you be open to a quick chat about {value_proposition}? Reply STOP to opt out.";

/// Per-channel templates with `{name}`, `{company}`, `{industry}`,
/// `{value_proposition}` and `{sender_name}` placeholders.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    pub email_subject: String,
    pub email_body: String,
    pub sms_body: String,
    pub value_proposition: String,
    pub sender_name: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            email_body: DEFAULT_EMAIL_BODY.to_string(),
            sms_body: DEFAULT_SMS_BODY.to_string(),
            value_proposition: "streamline your outreach".to_string(),
            sender_name: "Your Name".to_string(),
        }
    }
}

impl MessageTemplates {
    /// Build templates from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            email_subject: std::env::var("EMAIL_SUBJECT_TEMPLATE")
                .unwrap_or(defaults.email_subject),
            email_body: std::env::var("EMAIL_TEMPLATE").unwrap_or(defaults.email_body),
            sms_body: std::env::var("SMS_TEMPLATE").unwrap_or(defaults.sms_body),
            value_proposition: std::env::var("VALUE_PROPOSITION")
                .unwrap_or(defaults.value_proposition),
            sender_name: std::env::var("SENDER_NAME").unwrap_or(defaults.sender_name),
        }
    }

    /// Substitute placeholders with the record's data.
    ///
    /// Empty record fields fall back to neutral phrasing so a sparse row
    /// still renders a sendable message.
    pub fn render(&self, template: &str, record: &LeadRecord) -> String {
        let name = non_empty(&record.contact_person, "there");
        let company = non_empty(&record.company, "your company");
        let industry = non_empty(&record.industry, "your industry");

        template
            .replace("{name}", name)
            .replace("{company}", company)
            .replace("{industry}", industry)
            .replace("{value_proposition}", &self.value_proposition)
            .replace("{sender_name}", &self.sender_name)
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_placeholders() {
        let templates = MessageTemplates {
            value_proposition: "reach more buyers".into(),
            sender_name: "Sam".into(),
            ..Default::default()
        };
        let record = LeadRecord {
            contact_person: "Jordan".into(),
            company: "Acme Exports".into(),
            industry: "Textiles".into(),
            ..Default::default()
        };

        let body = templates.render(&templates.email_body, &record);
        assert!(body.contains("Hi Jordan,"));
        assert!(body.contains("Acme Exports"));
        assert!(body.contains("Textiles"));
        assert!(body.contains("reach more buyers"));
        assert!(body.ends_with("Sam"));
        assert!(!body.contains('{'));
    }

    #[test]
    fn render_falls_back_on_sparse_records() {
        let templates = MessageTemplates::default();
        let record = LeadRecord {
            contact_email: "a@b.example".into(),
            ..Default::default()
        };

        let body = templates.render(&templates.email_body, &record);
        assert!(body.contains("Hi there,"));
        assert!(body.contains("your company"));
        assert!(body.contains("your industry"));
    }

    #[test]
    fn subject_renders_company() {
        let templates = MessageTemplates::default();
        let record = LeadRecord {
            company: "Acme".into(),
            ..Default::default()
        };
        assert_eq!(
            templates.render(&templates.email_subject, &record),
            "Quick question for Acme"
        );
    }
}
