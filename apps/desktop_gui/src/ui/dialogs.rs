//! Dialog presenter: renders the pending queue requests and maps user
//! interaction onto queue resolutions. Holds no business state; every
//! decision belongs to the consumer awaiting the dialog future.

use client_core::{AlertView, ConfirmView, DialogKind, DialogQueue};
use eframe::egui;

fn kind_color(kind: DialogKind) -> egui::Color32 {
    match kind {
        DialogKind::Info => egui::Color32::from_rgb(96, 156, 236),
        DialogKind::Warning => egui::Color32::from_rgb(230, 179, 60),
        DialogKind::Error => egui::Color32::from_rgb(222, 84, 84),
        DialogKind::Success => egui::Color32::from_rgb(88, 184, 108),
    }
}

fn kind_label(kind: DialogKind) -> &'static str {
    match kind {
        DialogKind::Info => "Info",
        DialogKind::Warning => "Warning",
        DialogKind::Error => "Error",
        DialogKind::Success => "Success",
    }
}

/// Renders one window per populated slot; both may be visible at once.
/// Escape dismisses the alert when one is showing, otherwise it cancels
/// the confirmation.
pub fn show_dialogs(ctx: &egui::Context, dialogs: &DialogQueue) {
    let escape = ctx.input(|input| input.key_pressed(egui::Key::Escape));
    let alert = dialogs.alert_view();
    let confirm = dialogs.confirm_view();
    let mut escape_taken = false;

    if let Some(view) = &alert {
        if show_alert(ctx, view) || escape {
            escape_taken = escape;
            dialogs.resolve_alert();
        }
    }
    if let Some(view) = &confirm {
        match show_confirm(ctx, view) {
            Some(result) => dialogs.resolve_confirm(result),
            None if escape && !escape_taken => dialogs.resolve_confirm(false),
            None => {}
        }
    }
}

fn show_alert(ctx: &egui::Context, view: &AlertView) -> bool {
    let mut acknowledged = false;
    egui::Window::new(view.title.as_str())
        .id(egui::Id::new("alert_dialog"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, -120.0])
        .show(ctx, |ui| {
            ui.set_max_width(420.0);
            ui.colored_label(kind_color(view.kind), kind_label(view.kind));
            ui.add_space(4.0);
            ui.label(view.message.as_str());
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button(view.confirm_label.as_str()).clicked() {
                    acknowledged = true;
                }
            });
        });
    acknowledged
}

fn show_confirm(ctx: &egui::Context, view: &ConfirmView) -> Option<bool> {
    let mut decision = None;
    egui::Window::new(view.title.as_str())
        .id(egui::Id::new("confirm_dialog"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 40.0])
        .show(ctx, |ui| {
            ui.set_max_width(420.0);
            ui.colored_label(kind_color(view.kind), kind_label(view.kind));
            ui.add_space(4.0);
            ui.label(view.message.as_str());
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button(view.confirm_label.as_str()).clicked() {
                    decision = Some(true);
                }
                if ui.button(view.cancel_label.as_str()).clicked() {
                    decision = Some(false);
                }
            });
        });
    decision
}
