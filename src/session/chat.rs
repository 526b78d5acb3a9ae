use std::collections::HashSet;

use chrono::Utc;

use crate::common::{
    ConversationKey, MAX_CONTENT_CHARS, Message, OutgoingMessage, Participant, RequestTag,
};
use crate::error::{ApiError, SendRejected};

use super::send::{PendingSend, SendResolution, SendState};

/// Work the session asks its owner to carry out. The session itself never
/// touches the network or the clock beyond stamping placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch(RequestTag),
    Send { ticket: u64, message: OutgoingMessage },
    StartPolling { epoch: u64 },
    StopPolling,
    /// Refetch once the post-send delay has passed.
    ScheduleRefetch { epoch: u64 },
}

/// What happened to a fetch completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// Issued for an abandoned conversation or overtaken by a newer fetch.
    Stale,
    Failed,
}

/// Message list and send state for the conversation on screen.
#[derive(Debug)]
pub struct ChatSession {
    participant: Participant,
    key: Option<ConversationKey>,
    messages: Vec<Message>,
    draft: String,
    send: SendState,
    epoch: u64,
    next_seq: u64,
    /// Highest fetch sequence applied in the current epoch.
    applied_seq: u64,
    next_ticket: u64,
}

impl ChatSession {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            key: None,
            messages: Vec::new(),
            draft: String::new(),
            send: SendState::Idle,
            epoch: 0,
            next_seq: 1,
            applied_seq: 0,
            next_ticket: 1,
        }
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn key(&self) -> Option<&ConversationKey> {
        self.key.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.send.is_pending()
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.key.is_some() && epoch == self.epoch
    }

    /// Switches to the conversation with `counterpart` (ignored for regular
    /// users, who always talk to the admin). Re-selecting the active
    /// conversation does nothing.
    pub fn select_conversation(&mut self, counterpart: Option<&str>) -> Vec<Effect> {
        let Some(key) = ConversationKey::for_participant(&self.participant, counterpart) else {
            log::warn!("No counterpart to chat with; conversation left unchanged");
            return Vec::new();
        };
        if self.key.as_ref() == Some(&key) {
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(3);
        if self.key.is_some() {
            effects.push(Effect::StopPolling);
        }

        self.epoch += 1;
        self.applied_seq = 0;
        self.messages.clear();
        log::info!("Conversation {key} selected (epoch {})", self.epoch);
        self.key = Some(key);

        effects.extend(self.refetch());
        effects.push(Effect::StartPolling { epoch: self.epoch });
        effects
    }

    pub fn refetch(&mut self) -> Vec<Effect> {
        let Some(key) = self.key.clone() else {
            return Vec::new();
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        vec![Effect::Fetch(RequestTag {
            key,
            epoch: self.epoch,
            seq,
        })]
    }

    pub fn poll_tick(&mut self, epoch: u64) -> Vec<Effect> {
        if !self.is_current(epoch) {
            log::debug!("Ignoring poll tick from epoch {epoch}");
            return Vec::new();
        }
        self.refetch()
    }

    pub fn refetch_due(&mut self, epoch: u64) -> Vec<Effect> {
        if !self.is_current(epoch) {
            log::debug!("Dropping post-send refetch from epoch {epoch}");
            return Vec::new();
        }
        self.refetch()
    }

    pub fn apply_fetch(
        &mut self,
        tag: &RequestTag,
        result: Result<Vec<Message>, ApiError>,
    ) -> FetchOutcome {
        if tag.epoch != self.epoch || self.key.as_ref() != Some(&tag.key) {
            log::debug!(
                "Discarding fetch #{} for {} (epoch {}, now {})",
                tag.seq,
                tag.key,
                tag.epoch,
                self.epoch
            );
            return FetchOutcome::Stale;
        }
        if tag.seq <= self.applied_seq {
            log::debug!(
                "Discarding fetch #{} overtaken by #{}",
                tag.seq,
                self.applied_seq
            );
            return FetchOutcome::Stale;
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(err) => {
                log::warn!("Refreshing {} failed: {err}", tag.key);
                return FetchOutcome::Failed;
            }
        };

        self.applied_seq = tag.seq;
        let mut seen = HashSet::with_capacity(fetched.len());
        self.messages = fetched
            .into_iter()
            .filter(|message| seen.insert(message.id.clone()))
            .collect();

        if let Some(pending) = self.send.pending() {
            if pending.epoch == self.epoch && !seen.contains(&pending.placeholder.id) {
                self.messages.push(pending.placeholder.clone());
            }
        }
        FetchOutcome::Applied
    }

    /// Sends the current draft optimistically. A rejection leaves the list
    /// and the draft exactly as they were.
    pub fn send(&mut self) -> Result<Vec<Effect>, SendRejected> {
        let content = self.draft.trim();
        if content.is_empty() {
            return Err(SendRejected::EmptyContent);
        }
        let len = content.chars().count();
        if len > MAX_CONTENT_CHARS {
            return Err(SendRejected::ContentTooLong { len });
        }
        let Some(key) = self.key.as_ref() else {
            return Err(SendRejected::NoCounterpart);
        };
        if self.send.is_pending() {
            return Err(SendRejected::SendInFlight);
        }

        let content = content.to_string();
        let ticket = self.next_ticket;
        let message = OutgoingMessage {
            from_id: self.participant.user_id.clone(),
            from_role: self.participant.role,
            to_id: key.counterpart_id.clone(),
            to_role: self.participant.role.counterpart(),
            content: content.clone(),
        };
        let pending = PendingSend::new(
            ticket,
            self.epoch,
            &self.participant,
            &key.counterpart_id,
            content,
            Utc::now(),
        );
        let placeholder = pending.placeholder.clone();

        self.send.begin(pending)?;
        self.next_ticket += 1;
        self.messages.push(placeholder);
        self.draft.clear();
        Ok(vec![Effect::Send { ticket, message }])
    }

    /// Resolves the send behind `ticket`, removing its placeholder.
    pub fn complete_send(&mut self, ticket: u64, result: Result<(), ApiError>) -> Vec<Effect> {
        let issued_in = self.send.pending().map(|pending| pending.epoch);
        let Some(resolution) = self.send.resolve(ticket, result.is_ok()) else {
            log::debug!("Ignoring completion for unknown send #{ticket}");
            return Vec::new();
        };
        self.messages
            .retain(|message| message.id != resolution.placeholder_id());

        match (resolution, result) {
            (SendResolution::Committed { .. }, _) => match issued_in {
                Some(epoch) if self.is_current(epoch) => vec![Effect::ScheduleRefetch { epoch }],
                _ => Vec::new(),
            },
            (SendResolution::RolledBack { content, .. }, result) => {
                if let Err(err) = result {
                    log::warn!("Sending message failed: {err}");
                }
                if self.draft.trim().is_empty() {
                    self.draft = content;
                } else {
                    log::warn!("Draft was edited while sending; failed text not restored");
                }
                Vec::new()
            }
        }
    }

    /// Tears the session down; anything still in flight becomes stale.
    pub fn close(&mut self) -> Vec<Effect> {
        if self.key.take().is_none() {
            return Vec::new();
        }
        self.epoch += 1;
        vec![Effect::StopPolling]
    }
}
