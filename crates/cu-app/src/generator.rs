use std::sync::Arc;
use std::time::Duration;
use rand::Rng;
use tracing::{error, info, warn};
use cu_core::{FragmentCorpus, GenerationParams, PromptSynthesizer};
use crate::cancel::CancelToken;
use crate::config::GeneratorConfig;
use crate::display::DisplaySink;
use crate::generator::backend::SynthesisService;
use crate::generator::writer::{Artifact, ArtifactWriter};
use crate::job::GenerationJob;
use crate::worker::JobCoordinator;

pub mod backend;
pub mod writer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: usize,
    pub saved: usize,
    pub failed: usize,
}

/// The unattended loop: synthesize, generate, persist, repeat.
pub struct Generator {
    corpus: FragmentCorpus,
    synthesizer: PromptSynthesizer,
    params: GenerationParams,
    coordinator: JobCoordinator,
    writer: ArtifactWriter,
    final_hold: Duration,
    max_iterations: Option<usize>,
}

impl Generator {
    pub fn new(config: &GeneratorConfig, corpus: FragmentCorpus, service: Arc<dyn SynthesisService>) -> Self {
        Self {
            corpus,
            synthesizer: PromptSynthesizer::default(),
            params: config.params.clone(),
            coordinator: JobCoordinator::new(service, config.poll_interval),
            writer: ArtifactWriter::new(config.output_dir.clone()),
            final_hold: config.final_hold,
            max_iterations: config.max_iterations,
        }
    }

    /// Loop until `cancel` fires or the iteration limit is reached.
    ///
    /// Cancellation is only observed between jobs; a job in flight always
    /// runs to completion.
    pub fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        display: &mut dyn DisplaySink,
        cancel: &CancelToken,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        info!("Writing artifacts to {}", self.writer.dir().display());

        while !cancel.is_cancelled() {
            if self.max_iterations.is_some_and(|max| summary.iterations >= max) {
                info!("Reached iteration limit ({})", summary.iterations);
                break;
            }

            summary.iterations += 1;
            match self.run_iteration(rng, display) {
                Some(_) => summary.saved += 1,
                None => summary.failed += 1,
            }

            // Hold the final frame on screen; also paces retries when the
            // service keeps failing.
            if cancel.wait_for(self.final_hold) {
                break;
            }
        }

        info!(
            "Stopped after {} iterations ({} saved, {} failed)",
            summary.iterations, summary.saved, summary.failed
        );
        summary
    }

    pub fn run_iteration<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        display: &mut dyn DisplaySink,
    ) -> Option<Artifact> {
        let prompt = self.synthesizer.synthesize(&self.corpus, rng);
        info!("Generated prompt: {}", prompt);

        if let Err(e) = display.show_prompt(&prompt) {
            warn!("Could not display prompt window: {}", e);
        }

        let mut job = GenerationJob::new(prompt, self.params.clone());
        let outcome = self.coordinator.run(&mut job, display);
        debug_assert!(job.status.is_complete());

        let Some(output) = outcome.output() else {
            warn!("Error generating image. Skipping...");
            return None;
        };

        let artifact = match self.writer.write(&output.raw, &job.prompt) {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Failed to save artifact: {}", e);
                return None;
            }
        };
        display.show_saved(&artifact);

        if let Some(image) = &output.image {
            if let Err(e) = display.show_final(image) {
                warn!("Could not display final image: {}", e);
            }
        }

        Some(artifact)
    }
}
