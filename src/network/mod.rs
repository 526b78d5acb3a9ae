pub mod api;
pub mod auth;
pub mod client;

pub use api::ApiClient;
pub use auth::{StaticToken, TokenFile, TokenSource, token_source};
pub use client::ApiWorker;
