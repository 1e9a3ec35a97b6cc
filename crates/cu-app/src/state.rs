use std::path::Path;
use std::sync::Arc;
use egui_wgpu::wgpu;
use egui_wgpu::wgpu::StoreOp;
use tracing::info;
use winit::event_loop::EventLoopProxy;
use winit::window::Window;
use crate::cancel::CancelToken;
use crate::events::{AppEvent, CuEvent};
use crate::gfx::GfxState;
use crate::ui;
use crate::ui::{UiEvent, UiState};

pub struct AppState {
    pub(crate) window: Arc<Window>,

    pub gfx: GfxState,
    pub ui: UiState,

    cancel: CancelToken,
}

impl AppState {
    pub async fn new(
        window: Arc<Window>,
        event_loop_proxy: Arc<EventLoopProxy<CuEvent>>,
        font_path: &Path,
        cancel: CancelToken,
    ) -> anyhow::Result<Self> {
        let gfx = GfxState::new(window.clone()).await?;
        let mut ui_state = UiState::new(&gfx, window.clone(), event_loop_proxy, font_path);

        // Side panels before the central panel.
        ui_state.add_component(Box::new(ui::TopPanel::default()));
        ui_state.add_component(Box::new(ui::PromptPanel::default()));
        ui_state.add_component(Box::new(ui::FinalPanel::default()));
        ui_state.add_component(Box::new(ui::PreviewPanel::default()));

        Ok(Self {
            window,
            gfx,
            ui: ui_state,
            cancel,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
        }
    }

    pub fn on_app_event(&mut self, event: &AppEvent) {
        self.ui.on_app_event(event);
    }

    pub fn on_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Quit => self.request_quit(),
        }
    }

    pub fn request_quit(&self) {
        if !self.cancel.is_cancelled() {
            info!("Quit requested, stopping after the current image");
            self.cancel.cancel();
        }
    }

    pub fn render(&mut self) -> anyhow::Result<()> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        let output = self.gfx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.gfx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder")
        });

        let full_output = self.ui.draw(&self.window);

        let platform_output = full_output.platform_output.clone();
        self.ui.egui_state.handle_platform_output(&self.window, platform_output);

        let shapes = full_output.shapes.clone();
        let pixels_per_point = full_output.pixels_per_point;
        let paint_jobs = self.ui.egui_ctx.tessellate(shapes, pixels_per_point);

        let screen_desc = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.ui.egui_renderer.update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }

        self.ui.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &paint_jobs,
            &screen_desc,
        );

        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.05, g: 0.05, b: 0.05, a: 1.0 }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            self.ui.egui_renderer.render(&mut rpass.forget_lifetime(), &paint_jobs, &screen_desc);
        }

        for id in &full_output.textures_delta.free {
            self.ui.egui_renderer.free_texture(id);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
