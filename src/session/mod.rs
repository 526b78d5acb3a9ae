//! Conversation state and the plumbing that keeps it fresh.

pub mod chat;
pub mod controller;
pub mod directory;
pub mod poll;
pub mod send;

pub use chat::{ChatSession, Effect, FetchOutcome};
pub use controller::{ChatController, Timings};
pub use directory::UserDirectory;
pub use poll::PollTimer;
pub use send::{PendingSend, SendResolution, SendState};
