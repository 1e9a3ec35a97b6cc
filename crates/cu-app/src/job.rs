use image::RgbaImage;
use cu_core::GenerationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::Idle => "⏳",
            Self::Submitting => "📤",
            Self::Polling => "⚡",
            Self::Completed => "✅",
            Self::Failed => "❌",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Submitting => "Submitting",
            Self::Polling => "Generating",
            Self::Completed => "Complete",
            Self::Failed => "Failed",
        }
    }

    pub fn color(&self) -> egui::Color32 {
        match self {
            Self::Idle => egui::Color32::GRAY,
            Self::Submitting => egui::Color32::LIGHT_BLUE,
            Self::Polling => egui::Color32::YELLOW,
            Self::Completed => egui::Color32::GREEN,
            Self::Failed => egui::Color32::RED,
        }
    }
}

/// Final image of a successful job.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Bytes exactly as the service encoded them. These carry the service's
    /// embedded generation metadata and are persisted untouched.
    pub raw: Vec<u8>,
    /// Decoded copy for display, if the payload could be decoded.
    pub image: Option<RgbaImage>,
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(GenerationOutput),
    Failed(String),
}

impl JobOutcome {
    pub fn output(self) -> Option<GenerationOutput> {
        match self {
            Self::Completed(output) => Some(output),
            Self::Failed(_) => None,
        }
    }
}

/// The single in-flight request to the synthesis service.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub prompt: String,
    pub params: GenerationParams,
    pub status: JobStatus,
    pub preview_frames: usize,
}

impl GenerationJob {
    pub fn new(prompt: String, params: GenerationParams) -> Self {
        Self {
            prompt,
            params,
            status: JobStatus::Idle,
            preview_frames: 0,
        }
    }
}
