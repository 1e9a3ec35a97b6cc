mod top_panel;
mod prompt_panel;
mod preview_panel;
mod final_panel;

pub use top_panel::TopPanel;
pub use prompt_panel::PromptPanel;
pub use preview_panel::PreviewPanel;
pub use final_panel::FinalPanel;

use std::path::Path;
use std::sync::Arc;
use egui::{ColorImage, Context, FontFamily};
use image::RgbaImage;
use tracing::{info, warn};
use winit::event_loop::EventLoopProxy;
use winit::window::Window;
use crate::events::{AppEvent, CuEvent};
use crate::gfx::GfxState;

pub const PROMPT_FONT: &str = "prompt";

#[derive(Debug, Clone)]
pub enum UiEvent {
    Quit,
}

pub struct UiContext {
    pub prompt_font: FontFamily,
    pub event_loop_proxy: Arc<EventLoopProxy<CuEvent>>,
}

impl UiContext {
    pub fn new(event_loop_proxy: Arc<EventLoopProxy<CuEvent>>, prompt_font: FontFamily) -> Self {
        Self {
            prompt_font,
            event_loop_proxy,
        }
    }

    pub fn send_event(&self, event: UiEvent) {
        if self.event_loop_proxy.send_event(CuEvent::Ui(event)).is_err() {
            warn!("Event loop closed, dropping UI event");
        }
    }
}

pub struct UiState {
    pub(crate) egui_state: egui_winit::State,
    pub(crate) egui_ctx: egui::Context,
    pub(crate) egui_renderer: egui_wgpu::Renderer,

    components: Vec<Box<dyn UiComponent>>,
    pub(crate) ui_ctx: UiContext,
}

impl UiState {
    pub fn new(
        gfx: &GfxState,
        window: Arc<Window>,
        event_loop_proxy: Arc<EventLoopProxy<CuEvent>>,
        font_path: &Path,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let prompt_font = install_prompt_font(&egui_ctx, font_path);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gfx.device, gfx.config.format, egui_wgpu::RendererOptions::default());

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            components: Vec::new(),
            ui_ctx: UiContext::new(event_loop_proxy, prompt_font),
        }
    }

    pub fn draw(&mut self, window: &Window) -> egui::FullOutput {
        let raw_input = self.egui_state.take_egui_input(window);

        self.egui_ctx.run(raw_input, |ctx| {
            for component in self.components.iter_mut() {
                component.show(ctx, &self.ui_ctx);
            }
        })
    }

    pub fn add_component(&mut self, component: Box<dyn UiComponent>) {
        self.components.push(component);
    }

    pub fn on_app_event(&mut self, event: &AppEvent) {
        for component in self.components.iter_mut() {
            component.on_app_event(&self.egui_ctx, event);
        }
    }
}

pub trait UiComponent : Send {
    fn show(&mut self, ctx: &Context, ui_ctx: &UiContext);

    fn on_app_event(&mut self, _ctx: &Context, _event: &AppEvent) {}
}

/// Register the prompt panel's TrueType font, falling back to egui's
/// proportional font when the file is missing or not a font.
fn install_prompt_font(ctx: &Context, path: &Path) -> FontFamily {
    let bytes = match std::fs::read(path) {
        Ok(bytes) if looks_like_font(&bytes) => bytes,
        Ok(_) => {
            warn!("{} is not a TrueType/OpenType font. Using default font.", path.display());
            return FontFamily::Proportional;
        }
        Err(e) => {
            warn!("TrueType font {} not found ({}). Using default font.", path.display(), e);
            return FontFamily::Proportional;
        }
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert(PROMPT_FONT.to_owned(), Arc::new(egui::FontData::from_owned(bytes)));
    fonts
        .families
        .insert(FontFamily::Name(PROMPT_FONT.into()), vec![PROMPT_FONT.to_owned()]);
    ctx.set_fonts(fonts);

    info!("Loaded prompt font from {}", path.display());
    FontFamily::Name(PROMPT_FONT.into())
}

fn looks_like_font(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") | Some(b"OTTO") | Some(b"ttcf")
    )
}

pub(crate) fn to_color_image(image: &RgbaImage) -> ColorImage {
    let size = [image.width() as usize, image.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, image.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_font_sniffing() {
        assert!(looks_like_font(&[0x00, 0x01, 0x00, 0x00, 0x00]));
        assert!(looks_like_font(b"OTTO...."));
        assert!(!looks_like_font(b"<html>"));
        assert!(!looks_like_font(b"ab"));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let ctx = Context::default();
        let family = install_prompt_font(&ctx, Path::new("no/such/font.ttf"));
        assert_eq!(family, FontFamily::Proportional);
    }

    #[test]
    fn test_color_image_conversion() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let color = to_color_image(&image);
        assert_eq!(color.size, [3, 2]);
        assert_eq!(color.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }
}
