use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use winit::{
    event::*,
    event_loop::ActiveEventLoop,
};
use winit::application::ApplicationHandler;
use winit::event_loop::{EventLoop, EventLoopProxy};
use winit::keyboard::Key;
use winit::window::{WindowAttributes, WindowId};
use crate::cancel::CancelToken;
use crate::events::{AppEvent, CuEvent};
use crate::state::AppState;

pub struct App {
    event_loop_proxy: Arc<EventLoopProxy<CuEvent>>,
    state: Option<AppState>,
    font_path: PathBuf,
    cancel: CancelToken,
    needs_redraw: bool,
    // App events that arrived before the window existed.
    pending: Vec<AppEvent>,
}

impl App {
    pub fn new(event_loop: &EventLoop<CuEvent>, font_path: PathBuf, cancel: CancelToken) -> Self {
        let event_loop_proxy = Arc::new(event_loop.create_proxy());

        Self {
            event_loop_proxy,
            state: None,
            font_path,
            cancel,
            needs_redraw: false,
            pending: Vec::new(),
        }
    }

    fn quit(&self) {
        match &self.state {
            Some(state) => state.request_quit(),
            None => self.cancel.cancel(),
        }
    }
}

impl ApplicationHandler<CuEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title("cutup")
            .with_inner_size(winit::dpi::LogicalSize::new(1600.0, 900.0));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                self.cancel.cancel();
                event_loop.exit();
                return;
            }
        };

        let state = pollster::block_on(AppState::new(
            window,
            self.event_loop_proxy.clone(),
            &self.font_path,
            self.cancel.clone(),
        ));

        match state {
            Ok(mut state) => {
                for event in self.pending.drain(..) {
                    state.on_app_event(&event);
                }
                self.state = Some(state);
                self.needs_redraw = true;
            }
            Err(e) => {
                error!("Failed to initialize viewer: {:#}", e);
                self.cancel.cancel();
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: CuEvent) {
        if let CuEvent::App(AppEvent::LoopFinished) = event {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            if let CuEvent::App(e) = event {
                self.pending.push(e);
            }
            return;
        };

        match event {
            CuEvent::Ui(e) => state.on_ui_event(e),
            CuEvent::App(e) => state.on_app_event(&e),
        }
        self.needs_redraw = true;
        state.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        if state.window.id() != window_id {
            return;
        }

        // Let egui handle the event first
        let response = state.ui.egui_state.on_window_event(&state.window, &event);

        if response.repaint {
            self.needs_redraw = true;
            state.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                self.quit();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let quit_key = matches!(key_event.logical_key.as_ref(), Key::Character("q" | "Q"));
                if quit_key && key_event.state == ElementState::Pressed && !response.consumed {
                    self.quit();
                }
            }
            WindowEvent::Resized(physical_size) => {
                state.resize(physical_size);
                self.needs_redraw = true;
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = state.render() {
                    error!("Render failed: {:#}", e);
                }
                self.needs_redraw = false;
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.needs_redraw {
            if let Some(state) = &self.state {
                state.window.request_redraw();
            }
        }
    }
}
