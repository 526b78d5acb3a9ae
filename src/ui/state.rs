use chrono::{DateTime, Utc};

use crate::common::ClientEvent;
use crate::error::ApiError;

const MAX_DEBUG_EVENTS: usize = 100;

fn failure_status(what: &str, err: &ApiError) -> String {
    format!("{what}: {}", err.user_message())
}

/// Entry in the debug panel's event log.
#[derive(Debug, Clone)]
pub struct DebugEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: &'static str,
    pub message: String,
}

/// View-only state; the conversation itself lives in the controller.
#[derive(Debug, Default)]
pub struct UiState {
    /// Last problem worth showing under the input bar.
    pub status: Option<String>,
    pub debug_events: Vec<DebugEvent>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_debug_event(&mut self, event_type: &'static str, message: impl Into<String>) {
        self.debug_events.push(DebugEvent {
            timestamp: Utc::now(),
            event_type,
            message: message.into(),
        });
        if self.debug_events.len() > MAX_DEBUG_EVENTS {
            self.debug_events.remove(0);
        }
    }

    /// Logs an incoming event and updates the status line for failures.
    pub fn record(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::MessagesFetched { tag, result } => match result {
                Ok(messages) => self.add_debug_event(
                    "FETCHED",
                    format!("#{} {}: {} messages", tag.seq, tag.key, messages.len()),
                ),
                Err(err) => {
                    if err.is_unauthorized() {
                        self.status = Some(failure_status("Could not load messages", err));
                    }
                    self.add_debug_event("FETCH_FAILED", format!("#{}: {err}", tag.seq));
                }
            },
            ClientEvent::MessageSent { ticket, result } => match result {
                Ok(()) => {
                    self.status = None;
                    self.add_debug_event("SENT", format!("send #{ticket} confirmed"));
                }
                Err(err) => {
                    self.status = Some(failure_status("Message not sent", err));
                    self.add_debug_event("SEND_FAILED", format!("send #{ticket}: {err}"));
                }
            },
            ClientEvent::DirectoryFetched { result, .. } => match result {
                Ok(users) => self.add_debug_event("DIRECTORY", format!("{} users", users.len())),
                Err(err) => {
                    self.status = Some(failure_status("Could not load users", err));
                    self.add_debug_event("DIRECTORY_FAILED", err.to_string());
                }
            },
            ClientEvent::PollTick { .. } | ClientEvent::RefetchDue { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ConversationKey, Participant, RequestTag, Role};

    #[test]
    fn debug_log_is_capped() {
        let mut state = UiState::new();
        for i in 0..(MAX_DEBUG_EVENTS + 5) {
            state.add_debug_event("TEST", i.to_string());
        }
        assert_eq!(state.debug_events.len(), MAX_DEBUG_EVENTS);
        assert_eq!(state.debug_events[0].message, "5");
    }

    #[test]
    fn failed_send_sets_status_and_success_clears_it() {
        let mut state = UiState::new();
        state.record(&ClientEvent::MessageSent {
            ticket: 1,
            result: Err(ApiError::WorkerUnavailable),
        });
        assert!(state.status.as_deref().unwrap().contains("not sent"));

        state.record(&ClientEvent::MessageSent {
            ticket: 2,
            result: Ok(()),
        });
        assert_eq!(state.status, None);
    }

    #[test]
    fn unauthorized_fetch_asks_for_login() {
        let participant = Participant::new("u1", Role::User);
        let tag = RequestTag {
            key: ConversationKey::for_participant(&participant, None).unwrap(),
            epoch: 1,
            seq: 1,
        };
        let mut state = UiState::new();
        state.record(&ClientEvent::MessagesFetched {
            tag: tag.clone(),
            result: Err(ApiError::Status {
                status: 500,
                body: String::new(),
            }),
        });
        assert_eq!(state.status, None);

        state.record(&ClientEvent::MessagesFetched {
            tag,
            result: Err(ApiError::Status {
                status: 401,
                body: "expired".into(),
            }),
        });
        assert!(state.status.as_deref().unwrap().contains("sign in again"));
    }
}
