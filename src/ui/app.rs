use eframe::egui;
use tokio::sync::mpsc;

use crate::common::ClientEvent;
use crate::session::ChatController;

use super::components::{chat_area, debug_panel, input_bar, sidebar};
use super::state::UiState;

pub struct ChatApp {
    controller: ChatController,
    event_receiver: mpsc::Receiver<ClientEvent>,
    state: UiState,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        mut controller: ChatController,
        event_receiver: mpsc::Receiver<ClientEvent>,
    ) -> Self {
        controller.start();
        Self {
            controller,
            event_receiver,
            state: UiState::new(),
        }
    }

    fn handle_client_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.record(&event);
            self.controller.handle_event(event);
        }
    }

    fn submit(&mut self) {
        match self.controller.submit() {
            Ok(()) => self.state.status = None,
            Err(rejected) => {
                self.state
                    .add_debug_event("SEND_REJECTED", rejected.to_string());
                self.state.status = Some(rejected.to_string());
            }
        }
    }

    fn title(&self) -> String {
        let session = self.controller.session();
        if !session.participant().is_admin() {
            return "Chat with Admin".to_string();
        }
        let selected = session.key().map(|key| key.counterpart_id.as_str());
        let name = selected
            .and_then(|id| self.controller.directory()?.find(id))
            .map(|user| user.label().to_string())
            .or_else(|| selected.map(str::to_string));
        match name {
            Some(name) => format!("Chat with {name}"),
            None => "Chat with Select User".to_string(),
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_client_events();

        if let Some(directory) = self.controller.directory() {
            let selected = self
                .controller
                .session()
                .key()
                .map(|key| key.counterpart_id.clone());
            let mut picked = None;
            egui::SidePanel::left("user_sidebar")
                .resizable(true)
                .default_width(220.0)
                .show(ctx, |ui| {
                    picked = sidebar::render(ui, directory, selected.as_deref());
                });
            if let Some(user_id) = picked {
                self.controller.select_user(&user_id);
            }
        }

        egui::SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                debug_panel::render(ui, &self.controller, &self.state);
            });

        let title = self.title();
        let own_id = self.controller.session().participant().user_id.clone();
        let can_send = self.controller.session().key().is_some()
            && !self.controller.session().is_sending();
        let mut send_requested = false;

        egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
            if let Some(status) = &self.state.status {
                ui.colored_label(egui::Color32::RED, status.as_str());
            }
            send_requested = input_bar::render(ui, self.controller.draft_mut(), can_send);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(title);
            ui.separator();
            chat_area::render(ui, self.controller.session().messages(), &own_id);
        });

        if send_requested {
            self.submit();
        }

        ctx.request_repaint();
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}
