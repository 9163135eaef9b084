//! Outreach channels: independent outbound delivery mechanisms.

pub mod dispatcher;
pub mod email;
pub mod sms;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use email::{EmailChannel, SmtpConfig};
pub use sms::{SmsChannel, SmsConfig};

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::record::LeadRecord;

/// The closed set of outreach channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Email => "email",
            ChannelKind::Sms => "sms",
        }
    }
}

/// One outbound delivery mechanism with its own success/failure outcome.
#[async_trait]
pub trait OutreachChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Whether the record carries the contact handle this channel needs.
    fn applies_to(&self, record: &LeadRecord) -> bool;

    /// Send one outreach message. An `Err` is a per-channel failure; the
    /// dispatcher converts it to `false` and carries on with other channels.
    async fn attempt(&self, record: &LeadRecord) -> Result<(), ChannelError>;
}
