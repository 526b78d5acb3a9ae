use eframe::egui;

use crate::session::UserDirectory;

/// Admin user list. Returns the id of a user clicked this frame.
pub fn render(
    ui: &mut egui::Ui,
    directory: &UserDirectory,
    selected: Option<&str>,
) -> Option<String> {
    let mut clicked = None;
    let users = directory.users();

    ui.horizontal(|ui| {
        ui.heading("Active Users");
        ui.label(egui::RichText::new(users.len().to_string()).weak());
    });
    ui.separator();

    if users.is_empty() {
        let note = if directory.is_loaded() {
            "No users yet."
        } else {
            "Loading users..."
        };
        ui.label(note);
        return None;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for user in users {
            let is_selected = selected == Some(user.id.as_str());
            ui.horizontal(|ui| {
                if is_selected {
                    ui.colored_label(egui::Color32::GREEN, "●");
                }
                if ui.selectable_label(is_selected, user.label()).clicked() && !is_selected {
                    clicked = Some(user.id.clone());
                }
            });
            let id = format!("ID: {}", short_id(&user.id));
            ui.label(egui::RichText::new(id).small().weak());
        }
    });

    clicked
}

fn short_id(id: &str) -> String {
    match id.char_indices().nth(8) {
        Some((cut, _)) => format!("{}...", &id[..cut]),
        None => id.to_string(),
    }
}
