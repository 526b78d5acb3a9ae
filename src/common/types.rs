use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counterpart id a regular user always talks to.
pub const ADMIN_COUNTERPART: &str = "admin";

/// Longest message body accepted, counted in characters.
pub const MAX_CONTENT_CHARS: usize = 500;

/// Which side of the support chat a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Role of whoever sits on the other end of a conversation.
    pub fn counterpart(self) -> Role {
        match self {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role `{other}` (expected admin or user)")),
        }
    }
}

/// The local side of the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub role: Role,
}

impl Participant {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identifies the thread currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub role: Role,
    pub counterpart_id: String,
    thread_id: String,
}

impl ConversationKey {
    /// Builds the key for `participant`. Admins need an explicit counterpart,
    /// users always talk to the admin and ignore `counterpart`.
    pub fn for_participant(participant: &Participant, counterpart: Option<&str>) -> Option<Self> {
        match participant.role {
            Role::User => Some(Self {
                role: Role::User,
                counterpart_id: ADMIN_COUNTERPART.to_string(),
                thread_id: participant.user_id.clone(),
            }),
            Role::Admin => {
                let counterpart = counterpart.map(str::trim).filter(|id| !id.is_empty())?;
                Some(Self {
                    role: Role::Admin,
                    counterpart_id: counterpart.to_string(),
                    thread_id: counterpart.to_string(),
                })
            }
        }
    }

    /// Id of the non-admin party; the server files every thread under it.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.role, self.counterpart_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Persisted,
    Pending,
}

/// One chat line, either confirmed by the server or shown optimistically.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_role: Option<Role>,
    pub recipient_id: String,
    pub recipient_role: Option<Role>,
    pub content: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub origin: MessageOrigin,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.origin == MessageOrigin::Pending
    }
}

/// Chat-eligible user as listed for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    #[serde(rename = "name", default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
}

impl DirectoryUser {
    /// Name to show, falling back to the id like the web widget did.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}
