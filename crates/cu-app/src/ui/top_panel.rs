use egui::{Color32, Context, RichText};
use crate::events::AppEvent;
use crate::job::JobStatus;
use crate::ui::{UiComponent, UiContext, UiEvent};

pub struct TopPanel {
    status: JobStatus,
    saved: usize,
    quit_requested: bool,
}

impl Default for TopPanel {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            saved: 0,
            quit_requested: false,
        }
    }
}

impl UiComponent for TopPanel {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🎨 cutup");
                ui.separator();
                ui.label(RichText::new("Status:").color(Color32::LIGHT_BLUE));
                ui.label(
                    RichText::new(format!("{} {}", self.status.icon(), self.status.label()))
                        .color(self.status.color())
                );
                ui.separator();
                ui.label(format!("Saved: {}", self.saved));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.quit_requested {
                        ui.label(RichText::new("Stopping after this image...").color(Color32::GRAY));
                    } else if ui.button("⏹ Stop (Q)").clicked() {
                        self.quit_requested = true;
                        ui_ctx.send_event(UiEvent::Quit);
                    }
                });
            });
        });
    }

    fn on_app_event(&mut self, _ctx: &Context, event: &AppEvent) {
        match event {
            AppEvent::Status(status) => self.status = *status,
            AppEvent::Saved(_) => self.saved += 1,
            _ => {}
        }
    }
}
