use std::path::PathBuf;
use image::RgbaImage;
use crate::job::JobStatus;
use crate::ui::UiEvent;

#[derive(Debug, Clone)]
pub enum CuEvent {
    Ui(UiEvent),
    App(AppEvent),
}

/// Sent from the generation loop to the viewer.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Prompt(String),
    Preview {
        frame: RgbaImage,
        progress: f32,
    },
    Final(RgbaImage),
    Saved(PathBuf),
    Status(JobStatus),
    LoopFinished,
}
