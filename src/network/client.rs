use std::sync::Arc;

use tokio::sync::mpsc;

use crate::common::{ClientEvent, NetworkCommand};

use super::api::ApiClient;

/// Runs requests for the controller. Each command gets its own task, so
/// completions may come back in any order; the controller's tags sort that
/// out.
pub struct ApiWorker {
    api: Arc<ApiClient>,
    event_sender: mpsc::Sender<ClientEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl ApiWorker {
    pub fn new(
        api: ApiClient,
        event_sender: mpsc::Sender<ClientEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            api: Arc::new(api),
            event_sender,
            command_receiver,
        }
    }

    /// Serves commands until every command sender is dropped.
    pub async fn run(mut self) {
        log::info!("Network worker started against {}", self.api.base_url());

        while let Some(command) = self.command_receiver.recv().await {
            self.handle_command(command);
        }

        log::info!("Network worker stopped");
    }

    fn handle_command(&self, command: NetworkCommand) {
        let api = Arc::clone(&self.api);
        let events = self.event_sender.clone();

        tokio::spawn(async move {
            let event = match command {
                NetworkCommand::FetchMessages { tag } => {
                    log::debug!("Fetching {} (#{})", tag.key, tag.seq);
                    let result = api.fetch_messages(tag.key.thread_id()).await;
                    ClientEvent::MessagesFetched { tag, result }
                }
                NetworkCommand::SendMessage { ticket, message } => {
                    log::debug!("Sending message #{ticket} to {}", message.to_id);
                    let result = api.send_message(&message).await;
                    ClientEvent::MessageSent { ticket, result }
                }
                NetworkCommand::FetchDirectory { seq } => {
                    let result = api.fetch_directory().await;
                    ClientEvent::DirectoryFetched { seq, result }
                }
            };

            if let Err(err) = events.send(event).await {
                log::warn!("Dropping response, controller is gone: {err}");
            }
        });
    }
}
