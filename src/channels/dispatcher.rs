//! Outreach dispatcher. Attempts every applicable channel and aggregates
//! partial success.

use std::sync::Arc;

use tracing::warn;

use crate::channels::{ChannelKind, OutreachChannel};
use crate::error::DispatchError;
use crate::record::{Action, LeadRecord};

/// Per-channel outcomes of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub email_sent: bool,
    pub sms_sent: bool,
}

impl DispatchOutcome {
    /// True when at least one channel reached the contact.
    pub fn any(&self) -> bool {
        self.email_sent || self.sms_sent
    }

    /// The ACTION value derived purely from the two booleans.
    pub fn action(&self) -> Option<Action> {
        Action::from_channels(self.email_sent, self.sms_sent)
    }
}

/// Sends one record through every configured channel.
///
/// Channels succeed or fail independently; a channel failure is logged,
/// converted to `false` in the outcome, and never aborts the others.
pub struct Dispatcher {
    channels: Vec<Arc<dyn OutreachChannel>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Arc<dyn OutreachChannel>>) -> Self {
        Self { channels }
    }

    /// Attempt every channel that applies to the record.
    ///
    /// A record no configured channel can reach is an error to the caller,
    /// not a silent no-op.
    pub async fn dispatch(&self, record: &LeadRecord) -> Result<DispatchOutcome, DispatchError> {
        let applicable: Vec<_> = self
            .channels
            .iter()
            .filter(|c| c.applies_to(record))
            .collect();
        if applicable.is_empty() {
            return Err(DispatchError::NoContactHandle);
        }

        let mut outcome = DispatchOutcome::default();
        for channel in applicable {
            match channel.attempt(record).await {
                Ok(()) => match channel.kind() {
                    ChannelKind::Email => outcome.email_sent = true,
                    ChannelKind::Sms => outcome.sms_sent = true,
                },
                Err(e) => {
                    warn!(
                        channel = channel.kind().as_str(),
                        email = %record.contact_email,
                        error = %e,
                        "Channel attempt failed"
                    );
                }
            }
        }
        Ok(outcome)
    }
}
