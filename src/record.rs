//! Canonical lead record and the status/action vocabularies persisted in the
//! external store.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::schema;

/// Date format used for the follow-up column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Processing status, persisted as a literal string in the STATUS column.
///
/// An empty cell means the record is pending and eligible for the next
/// pipeline pass. `Email Verified` is the single terminal-success label:
/// "verified and actioned" once an ACTION value is present alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Pending,
    EmailVerified,
    Invalid,
    Failed,
    /// A label this pipeline does not own. Preserved verbatim so a foreign
    /// writer's state is never clobbered or re-queued.
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "",
            Status::EmailVerified => "Email Verified",
            Status::Invalid => "Invalid",
            Status::Failed => "Failed",
            Status::Other(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" => Status::Pending,
            "Email Verified" => Status::EmailVerified,
            "Invalid" => Status::Invalid,
            "Failed" => Status::Failed,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

/// Which channels reached the contact, persisted in the ACTION column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Emailed,
    Texted,
    EmailedAndTexted,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Emailed => "Emailed",
            Action::Texted => "Texted",
            Action::EmailedAndTexted => "Emailed & texted",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Emailed" => Some(Action::Emailed),
            "Texted" => Some(Action::Texted),
            "Emailed & texted" => Some(Action::EmailedAndTexted),
            _ => None,
        }
    }

    /// Derive the action purely from the per-channel outcomes.
    pub fn from_channels(email_sent: bool, sms_sent: bool) -> Option<Self> {
        match (email_sent, sms_sent) {
            (true, true) => Some(Action::EmailedAndTexted),
            (true, false) => Some(Action::Emailed),
            (false, true) => Some(Action::Texted),
            (false, false) => None,
        }
    }
}

/// One row of the external store, canonicalized.
///
/// `contact_email` is the unique key; every write re-resolves the target row
/// by this key because row positions can shift between read and write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeadRecord {
    pub company: String,
    pub contact_person: String,
    pub contact_designation: String,
    pub contact_number: Option<String>,
    pub contact_email: String,
    pub location: String,
    pub industry: String,
    pub status: Status,
    pub action: Option<Action>,
    pub remarks: String,
    pub follow_up_date: Option<NaiveDate>,
    pub retry_count: u32,
}

impl LeadRecord {
    /// Build a record from a canonical-field → cell-value mapping.
    ///
    /// Missing fields degrade to empty values; malformed dates and counters
    /// degrade to `None`/`0` rather than failing the row.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let cell = |name: &str| fields.get(name).map(String::as_str).unwrap_or("").trim().to_string();

        let number = cell(schema::CONTACT_NUMBER);
        let follow_up = fields
            .get(schema::FOLLOW_UP_DATE)
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok());
        let retry_count = fields
            .get(schema::RETRY_COUNT)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0);

        Self {
            company: cell(schema::COMPANY),
            contact_person: cell(schema::CONTACT_PERSON),
            contact_designation: cell(schema::CONTACT_DESIGNATION),
            contact_number: if number.is_empty() { None } else { Some(number) },
            contact_email: cell(schema::CONTACT_EMAIL),
            location: cell(schema::LOCATION),
            industry: cell(schema::INDUSTRY),
            status: Status::parse(&cell(schema::STATUS)),
            action: Action::parse(&cell(schema::ACTION)),
            remarks: cell(schema::REMARKS),
            follow_up_date: follow_up,
            retry_count,
        }
    }

    /// Project the record back onto canonical field names, as cell strings.
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        let mut put = |name: &str, value: String| {
            fields.insert(name.to_string(), value);
        };
        put(schema::COMPANY, self.company.clone());
        put(schema::CONTACT_PERSON, self.contact_person.clone());
        put(schema::CONTACT_DESIGNATION, self.contact_designation.clone());
        put(
            schema::CONTACT_NUMBER,
            self.contact_number.clone().unwrap_or_default(),
        );
        put(schema::CONTACT_EMAIL, self.contact_email.clone());
        put(schema::LOCATION, self.location.clone());
        put(schema::INDUSTRY, self.industry.clone());
        put(schema::STATUS, self.status.as_str().to_string());
        put(
            schema::ACTION,
            self.action.map(|a| a.as_str().to_string()).unwrap_or_default(),
        );
        put(schema::REMARKS, self.remarks.clone());
        put(
            schema::FOLLOW_UP_DATE,
            self.follow_up_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        );
        put(schema::RETRY_COUNT, self.retry_count.to_string());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_known_labels() {
        for status in [
            Status::Pending,
            Status::EmailVerified,
            Status::Invalid,
            Status::Failed,
        ] {
            assert_eq!(Status::parse(status.as_str()), status);
        }
    }

    #[test]
    fn status_preserves_foreign_labels() {
        let status = Status::parse("Processed");
        assert_eq!(status, Status::Other("Processed".to_string()));
        assert_eq!(status.as_str(), "Processed");
        assert!(!status.is_pending());
    }

    #[test]
    fn status_whitespace_is_pending() {
        assert!(Status::parse("   ").is_pending());
    }

    #[test]
    fn action_derivation_table() {
        assert_eq!(
            Action::from_channels(true, true),
            Some(Action::EmailedAndTexted)
        );
        assert_eq!(Action::from_channels(true, false), Some(Action::Emailed));
        assert_eq!(Action::from_channels(false, true), Some(Action::Texted));
        assert_eq!(Action::from_channels(false, false), None);
    }

    #[test]
    fn record_from_fields_degrades_gracefully() {
        let mut fields = HashMap::new();
        fields.insert(schema::CONTACT_EMAIL.to_string(), " a@b.com ".to_string());
        fields.insert(schema::CONTACT_NUMBER.to_string(), "".to_string());
        fields.insert(schema::FOLLOW_UP_DATE.to_string(), "not-a-date".to_string());
        fields.insert(schema::RETRY_COUNT.to_string(), "two".to_string());

        let record = LeadRecord::from_fields(&fields);
        assert_eq!(record.contact_email, "a@b.com");
        assert_eq!(record.contact_number, None);
        assert_eq!(record.follow_up_date, None);
        assert_eq!(record.retry_count, 0);
        assert!(record.status.is_pending());
    }

    #[test]
    fn record_projection_round_trips() {
        let record = LeadRecord {
            company: "Acme Exports".into(),
            contact_person: "Jordan Lee".into(),
            contact_email: "jordan@acme.example".into(),
            contact_number: Some("+15550100".into()),
            industry: "Textiles".into(),
            status: Status::EmailVerified,
            action: Some(Action::Emailed),
            retry_count: 2,
            ..Default::default()
        };

        let rebuilt = LeadRecord::from_fields(&record.to_fields());
        assert_eq!(rebuilt, record);
    }
}
