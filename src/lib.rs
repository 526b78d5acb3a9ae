//! Chat client for the Beehive admin/user support channel.
//!
//! [`session::ChatSession`] owns the conversation state and decides what to
//! fetch and when; [`session::ChatController`] turns those decisions into
//! requests for the [`network::ApiWorker`] and timers on the tokio runtime.
//! The egui window and the terminal front-end both sit on top of the
//! controller.

pub mod analytics;
pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod session;
pub mod terminal;
pub mod ui;
