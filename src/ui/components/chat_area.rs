use eframe::egui;

use crate::common::Message;

pub fn render(ui: &mut egui::Ui, messages: &[Message], own_id: &str) {
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet. Start a conversation!").weak());
                return;
            }
            for message in messages {
                render_message(ui, message, own_id);
            }
        });
}

fn render_message(ui: &mut egui::Ui, message: &Message, own_id: &str) {
    let mine = message.sender_id == own_id;
    let time = message
        .sent_at
        .map(|sent_at| sent_at.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_default();

    let layout = if mine {
        egui::Layout::right_to_left(egui::Align::TOP)
    } else {
        egui::Layout::left_to_right(egui::Align::TOP)
    };
    ui.with_layout(layout, |ui| {
        let mut text = egui::RichText::new(&message.content);
        if message.is_pending() {
            text = text.italics().weak();
        }
        ui.label(text);
        let meta = if message.is_pending() {
            "sending...".to_string()
        } else {
            time
        };
        ui.label(egui::RichText::new(meta).small().weak());
    });
}
