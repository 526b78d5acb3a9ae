use thiserror::Error;

use crate::common::MAX_CONTENT_CHARS;

/// Failure talking to the chat service. Every variant is treated as
/// transient by the session.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer; 401/403 land here too.
    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid endpoint url: {0}")]
    Url(String),

    /// The worker went away before the request could be handed over.
    #[error("network worker unavailable")]
    WorkerUnavailable,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401 | 403, .. })
    }

    /// Text for the person at the keyboard; auth failures ask for a new login.
    pub fn user_message(&self) -> String {
        if self.is_unauthorized() {
            "session expired, please sign in again".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Input rejected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyContent,

    #[error("message is {len} characters long, the limit is {max}", max = MAX_CONTENT_CHARS)]
    ContentTooLong { len: usize },

    #[error("select a user before sending")]
    NoCounterpart,

    #[error("previous message is still being sent")]
    SendInFlight,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
