use image::RgbaImage;
use tracing::{debug, info};
use winit::event_loop::EventLoopProxy;
use crate::error::AppError;
use crate::generator::writer::Artifact;
use crate::events::{AppEvent, CuEvent};
use crate::job::JobStatus;

/// Where the generation loop shows its work.
///
/// Every method is best-effort: callers log failures and carry on.
pub trait DisplaySink: Send {
    fn show_prompt(&mut self, prompt: &str) -> Result<(), AppError>;

    fn show_preview(&mut self, frame: &RgbaImage, progress: f32) -> Result<(), AppError>;

    fn show_final(&mut self, image: &RgbaImage) -> Result<(), AppError>;

    fn show_status(&mut self, _status: JobStatus) {}

    fn show_saved(&mut self, _artifact: &Artifact) {}
}

/// Headless sink that only logs.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn show_prompt(&mut self, prompt: &str) -> Result<(), AppError> {
        info!("Prompt: {}", prompt);
        Ok(())
    }

    fn show_preview(&mut self, frame: &RgbaImage, progress: f32) -> Result<(), AppError> {
        debug!("Preview {}x{} at {:.0}%", frame.width(), frame.height(), progress * 100.0);
        Ok(())
    }

    fn show_final(&mut self, image: &RgbaImage) -> Result<(), AppError> {
        info!("Final image {}x{}", image.width(), image.height());
        Ok(())
    }
}

/// Forwards frames to the viewer window running on the event loop thread.
pub struct WindowDisplay {
    proxy: EventLoopProxy<CuEvent>,
}

impl WindowDisplay {
    pub fn new(proxy: EventLoopProxy<CuEvent>) -> Self {
        Self { proxy }
    }

    fn push(&self, event: AppEvent) -> Result<(), AppError> {
        self.proxy
            .send_event(CuEvent::App(event))
            .map_err(|_| AppError::Display("viewer window is closed".into()))
    }
}

impl DisplaySink for WindowDisplay {
    fn show_prompt(&mut self, prompt: &str) -> Result<(), AppError> {
        self.push(AppEvent::Prompt(prompt.to_string()))
    }

    fn show_preview(&mut self, frame: &RgbaImage, progress: f32) -> Result<(), AppError> {
        self.push(AppEvent::Preview {
            frame: frame.clone(),
            progress,
        })
    }

    fn show_final(&mut self, image: &RgbaImage) -> Result<(), AppError> {
        self.push(AppEvent::Final(image.clone()))
    }

    fn show_status(&mut self, status: JobStatus) {
        if let Err(e) = self.push(AppEvent::Status(status)) {
            debug!("Could not display status: {}", e);
        }
    }

    fn show_saved(&mut self, artifact: &Artifact) {
        if let Err(e) = self.push(AppEvent::Saved(artifact.image_path.clone())) {
            debug!("Could not display saved artifact: {}", e);
        }
    }
}
