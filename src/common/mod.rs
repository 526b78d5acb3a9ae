pub mod commands;
pub mod events;
pub mod types;

pub use commands::{NetworkCommand, OutgoingMessage, RequestTag};
pub use events::ClientEvent;
pub use types::{
    ADMIN_COUNTERPART, ConversationKey, DirectoryUser, MAX_CONTENT_CHARS, Message, MessageOrigin,
    Participant, Role,
};
