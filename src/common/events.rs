use crate::error::ApiError;

use super::commands::RequestTag;
use super::types::{DirectoryUser, Message};

/// Everything that flows back into the controller: request completions from
/// the network worker and ticks from its own timers.
#[derive(Debug)]
pub enum ClientEvent {
    MessagesFetched {
        tag: RequestTag,
        result: Result<Vec<Message>, ApiError>,
    },
    MessageSent {
        ticket: u64,
        result: Result<(), ApiError>,
    },
    DirectoryFetched {
        seq: u64,
        result: Result<Vec<DirectoryUser>, ApiError>,
    },
    PollTick {
        epoch: u64,
    },
    RefetchDue {
        epoch: u64,
    },
}
