use serde::Serialize;

use super::types::{ConversationKey, Role};

/// Staleness tag carried by every conversation fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub key: ConversationKey,
    /// Conversation epoch the request was issued in.
    pub epoch: u64,
    /// Monotonic request number, never reused within a session.
    pub seq: u64,
}

/// Body of `POST /api/chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub from_id: String,
    pub from_role: Role,
    pub to_id: String,
    pub to_role: Role,
    pub content: String,
}

/// Requests the controller hands to the network worker.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    FetchMessages { tag: RequestTag },
    SendMessage { ticket: u64, message: OutgoingMessage },
    FetchDirectory { seq: u64 },
}
