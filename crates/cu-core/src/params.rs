/// Fixed sampling configuration sent with every job.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    pub scheduler: String,
    pub cfg_scale: f32,
    pub n_iter: u32,
    pub batch_size: u32,
    pub seed: i64,
    pub style: Option<StyleModifier>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            steps: 50,
            width: 960,
            height: 1080,
            sampler: "DPM++ 2M Karras".to_string(),
            scheduler: "Automatic".to_string(),
            cfg_scale: 17.0,
            n_iter: 1,
            batch_size: 1,
            seed: 252_479_142,
            style: Some(StyleModifier::default()),
        }
    }
}

impl GenerationParams {
    /// Prompt as submitted to the service, with the style token in front.
    pub fn styled_prompt(&self, prompt: &str) -> String {
        match &self.style {
            Some(style) => format!("{} {}", style.token(), prompt),
            None => prompt.to_string(),
        }
    }
}

/// LoRA reference prefixed to the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleModifier {
    pub lora: String,
    pub weight: f32,
}

impl Default for StyleModifier {
    fn default() -> Self {
        Self {
            lora: "digital_texture-000008".to_string(),
            weight: 1.0,
        }
    }
}

impl StyleModifier {
    pub fn token(&self) -> String {
        format!("<lora:{}:{:?}>", self.lora, self.weight)
    }
}
