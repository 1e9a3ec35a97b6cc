use egui::{Context, TextureHandle, TextureOptions};
use crate::events::AppEvent;
use crate::ui::{to_color_image, UiComponent, UiContext};

#[derive(Default)]
pub struct FinalPanel {
    texture: Option<TextureHandle>,
}

impl UiComponent for FinalPanel {
    fn show(&mut self, ctx: &Context, _ui_ctx: &UiContext) {
        egui::SidePanel::right("final_panel")
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.heading("Final Image");
                ui.separator();

                if let Some(texture) = &self.texture {
                    ui.add(
                        egui::Image::from_texture(texture)
                            .max_size(ui.available_size())
                            .maintain_aspect_ratio(true)
                    );
                } else {
                    ui.label("No image finished yet.");
                }
            });
    }

    fn on_app_event(&mut self, ctx: &Context, event: &AppEvent) {
        if let AppEvent::Final(image) = event {
            self.texture = Some(ctx.load_texture("final_image", to_color_image(image), TextureOptions::LINEAR));
        }
    }
}
