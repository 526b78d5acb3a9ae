//! Line-mode chat: incoming messages are printed as they show up, typed
//! lines are sent. Slash commands cover what the GUI sidebar does.

use std::collections::HashSet;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::common::{ClientEvent, ConversationKey, Message, Participant, Role};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::network::{ApiClient, ApiWorker};
use crate::session::{ChatController, ChatSession, Timings};

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalInput {
    Empty,
    Quit,
    Help,
    Users,
    Refresh,
    Retry,
    Select(String),
    Message(String),
}

pub fn parse_input(line: &str) -> TerminalInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return TerminalInput::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return TerminalInput::Message(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit" | "q"), _) => TerminalInput::Quit,
        (Some("users"), _) => TerminalInput::Users,
        (Some("refresh"), _) => TerminalInput::Refresh,
        (Some("retry"), _) => TerminalInput::Retry,
        (Some("select"), Some(target)) => TerminalInput::Select(target.to_string()),
        _ => TerminalInput::Help,
    }
}

const HELP: &str = "commands: /users, /select <id|number>, /refresh, /retry, /quit";

/// Prints each persisted message once per conversation.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    key: Option<ConversationKey>,
    printed: HashSet<String>,
}

impl TranscriptPrinter {
    /// Lines for messages not printed yet; a conversation switch starts over.
    pub fn new_lines(&mut self, session: &ChatSession) -> Vec<String> {
        let mut lines = Vec::new();
        if self.key.as_ref() != session.key() {
            self.key = session.key().cloned();
            self.printed.clear();
            if let Some(key) = &self.key {
                lines.push(format!("--- conversation with {} ---", key.counterpart_id));
            }
        }

        let own_id = &session.participant().user_id;
        for message in session.messages() {
            if message.is_pending() || !self.printed.insert(message.id.clone()) {
                continue;
            }
            lines.push(format_message(message, own_id));
        }
        lines
    }
}

pub fn format_message(message: &Message, own_id: &str) -> String {
    let time = message
        .sent_at
        .map(|sent_at| sent_at.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    // Admin accounts all show up as "admin"; users by their id.
    let who = if message.sender_id == own_id {
        "you".to_string()
    } else if message.sender_role == Some(Role::Admin) {
        Role::Admin.to_string()
    } else {
        message.sender_id.clone()
    };
    format!("[{time}] {who}: {}", message.content)
}

/// Report for a send that was rolled back; its text is back in the draft.
fn unsent_notice(reason: &str, draft: &str) -> String {
    if draft.trim().is_empty() {
        format!("not sent ({reason})")
    } else {
        format!("not sent ({reason}): \"{draft}\" kept, type /retry to send it again")
    }
}

/// Sends the draft. A worker that is already gone rolls the send back
/// before `submit` returns, which shows up as "not sending" right after.
fn submit_draft(controller: &mut ChatController, out: &mut Vec<String>) -> bool {
    match controller.submit() {
        Ok(()) => {
            if !controller.session().is_sending() {
                let reason = ApiError::WorkerUnavailable.user_message();
                out.push(unsent_notice(&reason, controller.session().draft()));
            }
            true
        }
        Err(rejected) => {
            out.push(format!("not sent: {rejected}"));
            false
        }
    }
}

/// Runs one typed command and returns the lines to show for it.
pub fn handle_input(controller: &mut ChatController, input: TerminalInput) -> Vec<String> {
    let mut out = Vec::new();
    match input {
        TerminalInput::Empty | TerminalInput::Quit => {}
        TerminalInput::Help => out.push(HELP.to_string()),
        TerminalInput::Users => match controller.directory() {
            Some(directory) if !directory.is_loaded() => out.push("no users loaded yet".into()),
            Some(directory) if directory.users().is_empty() => out.push("no users".into()),
            Some(directory) => {
                for (index, user) in directory.users().iter().enumerate() {
                    out.push(format!(
                        "{:>3}. {} ({}) {}",
                        index + 1,
                        user.label(),
                        user.username,
                        user.id
                    ));
                }
            }
            None => out.push("only admins have a user list".into()),
        },
        TerminalInput::Refresh => controller.refresh_directory(),
        TerminalInput::Retry => {
            if controller.session().draft().trim().is_empty() {
                out.push("nothing to retry".into());
            } else {
                submit_draft(controller, &mut out);
            }
        }
        TerminalInput::Select(target) => {
            let Some(directory) = controller.directory() else {
                out.push("only admins can pick a conversation".into());
                return out;
            };
            let user_id = match target.parse::<usize>() {
                Ok(number) if number >= 1 => directory
                    .users()
                    .get(number - 1)
                    .map(|user| user.id.clone()),
                _ => Some(target),
            };
            match user_id {
                Some(user_id) => controller.select_user(&user_id),
                None => out.push("no user with that number".into()),
            }
        }
        TerminalInput::Message(text) => {
            // An unsent draft survives a rejected line; a sent line replaces it.
            let unsent = std::mem::replace(controller.draft_mut(), text);
            if submit_draft(controller, &mut out) {
                if !unsent.trim().is_empty() {
                    out.insert(0, format!("dropped unsent message: \"{}\"", unsent.trim()));
                }
            } else {
                controller.set_draft(unsent);
            }
        }
    }
    out
}

/// Feeds one event to the controller and returns the lines it calls for.
pub fn apply_event(controller: &mut ChatController, event: ClientEvent) -> Vec<String> {
    let failure = match &event {
        ClientEvent::MessageSent { result: Err(err), .. } if controller.session().is_sending() => {
            Some(err.user_message())
        }
        _ => None,
    };
    controller.handle_event(event);

    match failure {
        Some(reason) if !controller.session().is_sending() => {
            vec![unsent_notice(&reason, controller.session().draft())]
        }
        _ => Vec::new(),
    }
}

pub async fn run_terminal(config: &AppConfig, participant: Participant) -> Result<()> {
    let api = ApiClient::from_config(config)?;

    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    let (event_tx, mut event_rx) = mpsc::channel(100);
    tokio::spawn(ApiWorker::new(api, event_tx.clone(), cmd_rx).run());

    let mut controller = ChatController::new(
        participant,
        Timings::from_config(config),
        cmd_tx,
        event_tx,
        Handle::current(),
    );
    controller.start();
    println!("{HELP}");

    let mut printer = TranscriptPrinter::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                for line in apply_event(&mut controller, event) {
                    println!("{line}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = parse_input(&line);
                if input == TerminalInput::Quit {
                    break;
                }
                for line in handle_input(&mut controller, input) {
                    println!("{line}");
                }
            }
            _ = &mut ctrl_c => break,
        }

        for line in printer.new_lines(controller.session()) {
            println!("{line}");
        }
    }

    controller.shutdown();
    Ok(())
}
