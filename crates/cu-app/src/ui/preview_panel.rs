use egui::{Color32, Context, TextureHandle, TextureOptions};
use crate::events::AppEvent;
use crate::ui::{to_color_image, UiComponent, UiContext};

/// Live sampler preview, replaced on every decoded poll frame.
#[derive(Default)]
pub struct PreviewPanel {
    texture: Option<TextureHandle>,
    progress: f32,
}

impl UiComponent for PreviewPanel {
    fn show(&mut self, ctx: &Context, _ui_ctx: &UiContext) {
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(Color32::from_gray(20)))
            .show(ctx, |ui| {
                ui.heading("Live Preview");
                ui.add(egui::ProgressBar::new(self.progress).show_percentage());
                ui.separator();

                match &self.texture {
                    Some(texture) => {
                        ui.centered_and_justified(|ui| {
                            ui.add(
                                egui::Image::from_texture(texture)
                                    .max_size(ui.available_size())
                                    .maintain_aspect_ratio(true)
                            );
                        });
                    }
                    None => {
                        ui.vertical_centered(|ui| {
                            ui.label("Waiting for the first preview frame...");
                        });
                    }
                }
            });
    }

    fn on_app_event(&mut self, ctx: &Context, event: &AppEvent) {
        match event {
            AppEvent::Prompt(_) => {
                self.texture = None;
                self.progress = 0.0;
            }
            AppEvent::Preview { frame, progress } => {
                self.progress = progress.clamp(0.0, 1.0);
                let image = to_color_image(frame);
                match &mut self.texture {
                    Some(texture) => texture.set(image, TextureOptions::LINEAR),
                    None => {
                        self.texture = Some(ctx.load_texture("live_preview", image, TextureOptions::LINEAR));
                    }
                }
            }
            AppEvent::Final(_) => self.progress = 1.0,
            _ => {}
        }
    }
}
