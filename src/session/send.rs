use std::mem;

use chrono::{DateTime, Utc};

use crate::common::{Message, MessageOrigin, Participant};
use crate::error::SendRejected;

/// An optimistic send waiting for the server's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub ticket: u64,
    /// Conversation epoch the send was issued in.
    pub epoch: u64,
    pub placeholder: Message,
    /// Trimmed text that went out, restored into the draft on failure.
    pub content: String,
}

impl PendingSend {
    pub fn new(
        ticket: u64,
        epoch: u64,
        sender: &Participant,
        recipient_id: &str,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        let placeholder = Message {
            id: placeholder_id(ticket, now),
            sender_id: sender.user_id.clone(),
            sender_role: Some(sender.role),
            recipient_id: recipient_id.to_string(),
            recipient_role: Some(sender.role.counterpart()),
            content: content.clone(),
            sent_at: Some(now),
            origin: MessageOrigin::Pending,
        };
        Self {
            ticket,
            epoch,
            placeholder,
            content,
        }
    }
}

/// `temp-<unix millis>-<ticket>`; the ticket keeps two sends in the same
/// millisecond apart.
pub fn placeholder_id(ticket: u64, now: DateTime<Utc>) -> String {
    format!("temp-{}-{ticket}", now.timestamp_millis())
}

/// How a pending send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResolution {
    Committed { placeholder_id: String },
    RolledBack { placeholder_id: String, content: String },
}

impl SendResolution {
    pub fn placeholder_id(&self) -> &str {
        match self {
            SendResolution::Committed { placeholder_id }
            | SendResolution::RolledBack { placeholder_id, .. } => placeholder_id,
        }
    }
}

/// idle -> pending(placeholder) -> committed | rolled back -> idle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SendState {
    #[default]
    Idle,
    Pending(PendingSend),
}

impl SendState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SendState::Pending(_))
    }

    pub fn pending(&self) -> Option<&PendingSend> {
        match self {
            SendState::Pending(pending) => Some(pending),
            SendState::Idle => None,
        }
    }

    pub fn begin(&mut self, pending: PendingSend) -> Result<(), SendRejected> {
        if self.is_pending() {
            return Err(SendRejected::SendInFlight);
        }
        *self = SendState::Pending(pending);
        Ok(())
    }

    /// The only way out of `Pending`. Returns `None` for an unknown or
    /// already-resolved ticket, so each send resolves at most once.
    pub fn resolve(&mut self, ticket: u64, succeeded: bool) -> Option<SendResolution> {
        match mem::take(self) {
            SendState::Pending(pending) if pending.ticket == ticket => {
                let placeholder_id = pending.placeholder.id;
                Some(if succeeded {
                    SendResolution::Committed { placeholder_id }
                } else {
                    SendResolution::RolledBack {
                        placeholder_id,
                        content: pending.content,
                    }
                })
            }
            other => {
                *self = other;
                None
            }
        }
    }
}
