use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::common::{ClientEvent, NetworkCommand, Participant};
use crate::config::AppConfig;
use crate::error::{ApiError, SendRejected};

use super::chat::{ChatSession, Effect};
use super::directory::UserDirectory;
use super::poll::{PollTimer, schedule_refetch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    /// Pause between a confirmed send and the refetch that shows it.
    pub refetch_delay: Duration,
}

impl Timings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            refetch_delay: Duration::from_millis(config.refetch_delay_ms),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            refetch_delay: Duration::from_millis(750),
        }
    }
}

/// Drives one chat session: turns session effects into worker commands and
/// timers, and feeds every `ClientEvent` back into the session. All state
/// changes happen on the caller's thread.
pub struct ChatController {
    session: ChatSession,
    directory: Option<UserDirectory>,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_sender: mpsc::Sender<ClientEvent>,
    runtime: Handle,
    timings: Timings,
    poll: Option<PollTimer>,
}

impl ChatController {
    pub fn new(
        participant: Participant,
        timings: Timings,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_sender: mpsc::Sender<ClientEvent>,
        runtime: Handle,
    ) -> Self {
        let directory = participant.is_admin().then(UserDirectory::new);
        Self {
            session: ChatSession::new(participant),
            directory,
            command_sender,
            event_sender,
            runtime,
            timings,
            poll: None,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn directory(&self) -> Option<&UserDirectory> {
        self.directory.as_ref()
    }

    /// Epoch of the running poll timer, `None` while nothing is polled.
    pub fn polling_epoch(&self) -> Option<u64> {
        self.poll.as_ref().map(PollTimer::epoch)
    }

    pub fn draft_mut(&mut self) -> &mut String {
        self.session.draft_mut()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.session.set_draft(text);
    }

    /// Admins load the directory first (it picks the conversation); users
    /// go straight to their thread with the admin.
    pub fn start(&mut self) {
        if self.directory.is_some() {
            self.refresh_directory();
        } else {
            let effects = self.session.select_conversation(None);
            self.run(effects);
        }
    }

    pub fn refresh_directory(&mut self) {
        let Some(directory) = self.directory.as_mut() else {
            return;
        };
        let seq = directory.request();
        self.dispatch(NetworkCommand::FetchDirectory { seq });
    }

    pub fn select_user(&mut self, user_id: &str) {
        let effects = self.session.select_conversation(Some(user_id));
        self.run(effects);
    }

    /// Sends the current draft.
    pub fn submit(&mut self) -> Result<(), SendRejected> {
        let effects = self.session.send()?;
        self.run(effects);
        Ok(())
    }

    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::MessagesFetched { tag, result } => {
                self.session.apply_fetch(&tag, result);
            }
            ClientEvent::MessageSent { ticket, result } => {
                let effects = self.session.complete_send(ticket, result);
                self.run(effects);
            }
            ClientEvent::DirectoryFetched { seq, result } => {
                let has_selection = self.session.key().is_some();
                let selected = self
                    .directory
                    .as_mut()
                    .and_then(|directory| directory.apply(seq, result, has_selection));
                if let Some(user_id) = selected {
                    log::info!("Auto-selecting {user_id}");
                    self.select_user(&user_id);
                }
            }
            ClientEvent::PollTick { epoch } => {
                let effects = self.session.poll_tick(epoch);
                self.run(effects);
            }
            ClientEvent::RefetchDue { epoch } => {
                let effects = self.session.refetch_due(epoch);
                self.run(effects);
            }
        }
    }

    pub fn shutdown(&mut self) {
        let effects = self.session.close();
        self.run(effects);
    }

    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(tag) => {
                    self.dispatch(NetworkCommand::FetchMessages { tag });
                }
                Effect::Send { ticket, message } => {
                    if !self.dispatch(NetworkCommand::SendMessage { ticket, message }) {
                        // Nobody will ever answer this send; roll it back now.
                        let follow_up = self
                            .session
                            .complete_send(ticket, Err(ApiError::WorkerUnavailable));
                        self.run(follow_up);
                    }
                }
                Effect::StartPolling { epoch } => {
                    if let Some(previous) = self.poll.take() {
                        previous.cancel();
                    }
                    self.poll = Some(PollTimer::start(
                        &self.runtime,
                        epoch,
                        self.timings.poll_interval,
                        self.event_sender.clone(),
                    ));
                }
                Effect::StopPolling => {
                    if let Some(timer) = self.poll.take() {
                        timer.cancel();
                    }
                }
                Effect::ScheduleRefetch { epoch } => {
                    schedule_refetch(
                        &self.runtime,
                        epoch,
                        self.timings.refetch_delay,
                        self.event_sender.clone(),
                    );
                }
            }
        }
    }

    fn dispatch(&self, command: NetworkCommand) -> bool {
        match self.command_sender.try_send(command) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to hand command to network worker: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DirectoryUser, Message, MessageOrigin, RequestTag, Role};

    struct Harness {
        controller: ChatController,
        commands: mpsc::Receiver<NetworkCommand>,
        events: mpsc::Receiver<ClientEvent>,
    }

    fn harness(participant: Participant) -> Harness {
        let (command_tx, commands) = mpsc::channel(16);
        let (event_tx, events) = mpsc::channel(16);
        let timings = Timings {
            poll_interval: Duration::from_secs(5),
            refetch_delay: Duration::from_millis(500),
        };
        let controller =
            ChatController::new(participant, timings, command_tx, event_tx, Handle::current());
        Harness {
            controller,
            commands,
            events,
        }
    }

    fn expect_fetch(commands: &mut mpsc::Receiver<NetworkCommand>) -> RequestTag {
        match commands.try_recv() {
            Ok(NetworkCommand::FetchMessages { tag }) => tag,
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    fn server_message(id: &str) -> Message {
        Message {
            id: id.into(),
            sender_id: "admin".into(),
            sender_role: Some(Role::Admin),
            recipient_id: "u1".into(),
            recipient_role: Some(Role::User),
            content: "hello".into(),
            sent_at: None,
            origin: MessageOrigin::Persisted,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn user_start_fetches_then_polls() {
        let mut h = harness(Participant::new("u1", Role::User));
        h.controller.start();

        let tag = expect_fetch(&mut h.commands);
        assert_eq!(tag.key.thread_id(), "u1");

        let tick = h.events.recv().await.unwrap();
        assert!(matches!(tick, ClientEvent::PollTick { epoch } if epoch == tag.epoch));
        h.controller.handle_event(tick);
        let polled = expect_fetch(&mut h.commands);
        assert!(polled.seq > tag.seq);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_lands_on_first_directory_user() {
        let mut h = harness(Participant::new("root", Role::Admin));
        h.controller.start();

        let seq = match h.commands.try_recv() {
            Ok(NetworkCommand::FetchDirectory { seq }) => seq,
            other => panic!("expected directory fetch, got {other:?}"),
        };
        let users = vec![
            DirectoryUser {
                id: "u1".into(),
                display_name: "Alice".into(),
                username: "alice".into(),
            },
            DirectoryUser {
                id: "u2".into(),
                display_name: "Bob".into(),
                username: "bob".into(),
            },
        ];
        h.controller.handle_event(ClientEvent::DirectoryFetched {
            seq,
            result: Ok(users),
        });

        let key = h.controller.session().key().unwrap();
        assert_eq!(key.counterpart_id, "u1");
        assert_eq!(expect_fetch(&mut h.commands).key.thread_id(), "u1");
        assert_eq!(h.controller.directory().unwrap().users().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_send_without_selection_issues_nothing() {
        let mut h = harness(Participant::new("root", Role::Admin));
        h.controller.set_draft("hi");

        assert_eq!(h.controller.submit(), Err(SendRejected::NoCounterpart));
        assert_eq!(h.controller.session().draft(), "hi");
        assert!(h.controller.session().messages().is_empty());
        assert!(h.commands.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_send_refetches_after_delay() {
        let mut h = harness(Participant::new("u1", Role::User));
        h.controller.start();
        let first = expect_fetch(&mut h.commands);
        h.controller.handle_event(ClientEvent::MessagesFetched {
            tag: first,
            result: Ok(vec![server_message("m1")]),
        });

        h.controller.set_draft("question");
        h.controller.submit().unwrap();
        let ticket = match h.commands.try_recv() {
            Ok(NetworkCommand::SendMessage { ticket, message }) => {
                assert_eq!(message.content, "question");
                ticket
            }
            other => panic!("expected a send, got {other:?}"),
        };
        assert_eq!(h.controller.session().messages().len(), 2);

        h.controller.handle_event(ClientEvent::MessageSent {
            ticket,
            result: Ok(()),
        });
        assert_eq!(h.controller.session().messages().len(), 1);

        let due = h.events.recv().await.unwrap();
        assert!(matches!(due, ClientEvent::RefetchDue { .. }));
        h.controller.handle_event(due);
        expect_fetch(&mut h.commands);
    }

    #[tokio::test(start_paused = true)]
    async fn send_rolls_back_when_worker_is_gone() {
        let mut h = harness(Participant::new("u1", Role::User));
        h.controller.start();
        expect_fetch(&mut h.commands);
        h.commands.close();

        h.controller.set_draft("hello");
        assert!(h.controller.submit().is_ok());
        assert!(h.controller.session().messages().is_empty());
        assert!(!h.controller.session().is_sending());
        assert_eq!(h.controller.session().draft(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn switching_users_stops_old_poll() {
        let mut h = harness(Participant::new("root", Role::Admin));
        h.controller.select_user("u1");
        let old = expect_fetch(&mut h.commands);
        h.controller.select_user("u2");
        let new = expect_fetch(&mut h.commands);
        assert!(new.epoch > old.epoch);
        assert_eq!(h.controller.polling_epoch(), Some(new.epoch));

        for _ in 0..3 {
            match h.events.recv().await.unwrap() {
                ClientEvent::PollTick { epoch } => assert_eq!(epoch, new.epoch),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_discards_late_answers() {
        let mut h = harness(Participant::new("u1", Role::User));
        h.controller.start();
        let tag = expect_fetch(&mut h.commands);
        assert_eq!(h.controller.polling_epoch(), Some(tag.epoch));
        h.controller.shutdown();
        assert_eq!(h.controller.polling_epoch(), None);

        h.controller.handle_event(ClientEvent::MessagesFetched {
            tag,
            result: Ok(vec![server_message("m1")]),
        });
        assert!(h.controller.session().messages().is_empty());
    }
}
