use eframe::egui;

use crate::session::ChatController;
use crate::ui::state::UiState;

pub fn render(ui: &mut egui::Ui, controller: &ChatController, state: &UiState) {
    let session = controller.session();
    ui.heading("Debug Info");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Conversation:");
        match session.key() {
            Some(key) => ui.label(key.to_string()),
            None => ui.label("(none)"),
        };
    });
    ui.horizontal(|ui| {
        ui.label("Epoch:");
        ui.label(session.epoch().to_string());
    });
    ui.horizontal(|ui| {
        ui.label("Polling:");
        match controller.polling_epoch() {
            Some(epoch) => ui.label(format!("epoch {epoch}")),
            None => ui.label("stopped"),
        };
    });
    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(session.messages().len().to_string());
        if session.is_sending() {
            ui.colored_label(egui::Color32::YELLOW, "sending");
        }
    });

    ui.separator();
    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(300.0)
        .show(ui, |ui| {
            for event in state.debug_events.iter().rev().take(20) {
                let time_str = event.timestamp.format("%H:%M:%S");
                let color = match event.event_type {
                    "SENT" | "FETCHED" => egui::Color32::GREEN,
                    "SEND_FAILED" | "FETCH_FAILED" | "DIRECTORY_FAILED" => egui::Color32::RED,
                    "SEND_REJECTED" => egui::Color32::YELLOW,
                    _ => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", time_str));
                    ui.label(&event.message);
                });
            }
        });
}
