pub mod corpus;
pub mod error;
pub mod prompt;
pub mod sampler;
mod params;

pub use corpus::FragmentCorpus;
pub use params::{GenerationParams, StyleModifier};
pub use prompt::PromptSynthesizer;
pub use sampler::{resolve_sampler_name, SamplerInfo};
