mod app;
mod cancel;
mod config;
mod display;
mod error;
mod events;
mod generator;
mod gfx;
mod job;
mod state;
mod ui;
mod worker;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};
use cu_core::FragmentCorpus;
use crate::app::App;
use crate::cancel::CancelToken;
use crate::config::GeneratorConfig;
use crate::display::{LogDisplay, WindowDisplay};
use crate::events::{AppEvent, CuEvent};
use crate::generator::backend::{SdApiClient, SynthesisService};
use crate::generator::{Generator, RunSummary};

/// Unattended cut-up prompt image generation against a Stable Diffusion API.
#[derive(Parser, Debug)]
#[command(name = "cutup", version)]
struct Cli {
    /// Fragment corpus, one comma-separated description per line
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Directory for generated images and prompt records
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Base URL of the synthesis service
    #[arg(long)]
    api_url: Option<String>,

    /// Environment file to load before reading CUTUP_* variables
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Run without a window; stop with Ctrl-C
    #[arg(long)]
    headless: bool,

    /// Stop after this many iterations
    #[arg(long)]
    max_iterations: Option<usize>,
}

impl Cli {
    fn apply(&self, mut config: GeneratorConfig) -> GeneratorConfig {
        if let Some(corpus) = &self.corpus {
            config.corpus_path = corpus.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        config.max_iterations = self.max_iterations.or(config.max_iterations);
        config
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(GeneratorConfig::load(cli.env_file.as_deref())?);

    let corpus = FragmentCorpus::load(&config.corpus_path)
        .with_context(|| format!("Cannot start without a corpus ({})", config.corpus_path.display()))?;

    let service: Arc<dyn SynthesisService> =
        Arc::new(SdApiClient::new(config.api_url.clone(), config.progress_timeout)?);
    info!("Using synthesis service at {}", config.api_url);

    let generator = Generator::new(&config, corpus, service);
    let cancel = CancelToken::new();

    let summary = if cli.headless {
        run_headless(generator, cancel)?
    } else {
        run_windowed(generator, cancel, config.font_path)?
    };

    info!("Done: {} images saved", summary.saved);
    Ok(())
}

fn run_headless(generator: Generator, cancel: CancelToken) -> anyhow::Result<RunSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping after the current image (again to abort)");
                signal_cancel.cancel();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Aborting in-flight generation");
                std::process::exit(130);
            }
        });

        let summary = tokio::task::spawn_blocking(move || {
            generator.run(&mut rand::rng(), &mut LogDisplay, &cancel)
        })
        .await?;

        Ok::<_, anyhow::Error>(summary)
    })
}

fn run_windowed(generator: Generator, cancel: CancelToken, font_path: PathBuf) -> anyhow::Result<RunSummary> {
    let event_loop: EventLoop<CuEvent> = EventLoop::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let proxy = event_loop.create_proxy();
    let loop_cancel = cancel.clone();
    let worker = thread::Builder::new()
        .name("generation-loop".into())
        .spawn(move || {
            let mut display = WindowDisplay::new(proxy.clone());
            let summary = generator.run(&mut rand::rng(), &mut display, &loop_cancel);
            let _ = proxy.send_event(CuEvent::App(AppEvent::LoopFinished));
            summary
        })?;

    let mut app = App::new(&event_loop, font_path, cancel.clone());
    let result = event_loop.run_app(&mut app);

    // The window may be gone while a job is still running.
    cancel.cancel();
    if !worker.is_finished() {
        info!("Waiting for the in-flight generation to finish");
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow::anyhow!("Generation loop panicked"))?;
    result?;

    Ok(summary)
}
