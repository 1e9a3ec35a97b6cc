use egui::{Color32, Context, FontId, RichText};
use crate::events::AppEvent;
use crate::ui::{UiComponent, UiContext};

const CANVAS_WIDTH: f32 = 400.0;
const CANVAS_HEIGHT: f32 = 350.0;
const CANVAS_MARGIN: i8 = 20;
const FONT_SIZE: f32 = 18.0;

/// Fixed-size black canvas with the current prompt word-wrapped in white.
#[derive(Default)]
pub struct PromptPanel {
    prompt: String,
}

impl UiComponent for PromptPanel {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext) {
        let inner_width = CANVAS_WIDTH - 2.0 * CANVAS_MARGIN as f32;
        let inner_height = CANVAS_HEIGHT - 2.0 * CANVAS_MARGIN as f32;

        egui::SidePanel::left("prompt_panel")
            .resizable(false)
            .exact_width(CANVAS_WIDTH + 16.0)
            .show(ctx, |ui| {
                ui.heading("Prompt & Metadata");
                ui.separator();

                egui::Frame::new()
                    .fill(Color32::BLACK)
                    .inner_margin(egui::Margin::same(CANVAS_MARGIN))
                    .show(ui, |ui| {
                        ui.set_width(inner_width);
                        ui.set_height(inner_height);

                        ui.add(
                            egui::Label::new(
                                RichText::new(&self.prompt)
                                    .color(Color32::WHITE)
                                    .font(FontId::new(FONT_SIZE, ui_ctx.prompt_font.clone()))
                            )
                            .wrap()
                        );
                    });
            });
    }

    fn on_app_event(&mut self, _ctx: &Context, event: &AppEvent) {
        if let AppEvent::Prompt(prompt) = event {
            self.prompt = prompt.clone();
        }
    }
}
