use serde::{Deserialize, Serialize};
use cu_core::GenerationParams;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Txt2ImgRequest {
    pub prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub sampler_name: String,
    pub scheduler: String,
    pub cfg_scale: f32,
    pub n_iter: u32,
    pub batch_size: u32,
    pub seed: i64,
}

impl Txt2ImgRequest {
    /// Build the request body, prefixing the style token and using the
    /// already-resolved sampler spelling.
    pub fn new(prompt: &str, params: &GenerationParams, sampler_name: String) -> Self {
        Self {
            prompt: params.styled_prompt(prompt),
            steps: params.steps,
            width: params.width,
            height: params.height,
            sampler_name,
            scheduler: params.scheduler.clone(),
            cfg_scale: params.cfg_scale,
            n_iter: params.n_iter,
            batch_size: params.batch_size,
            seed: params.seed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Txt2ImgResponse {
    /// Base64-encoded images, first one is the result.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressState {
    pub sampling_step: u32,
    pub sampling_steps: u32,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressResponse {
    pub progress: f32,
    pub eta_relative: f32,
    pub state: ProgressState,
    pub current_image: Option<String>,
    pub textinfo: Option<String>,
}

impl ProgressResponse {
    /// Preview payload, if the service has one yet.
    pub fn preview(&self) -> Option<&str> {
        self.current_image.as_deref().filter(|image| !image.is_empty())
    }
}
