use std::sync::Arc;
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use tracing::{debug, error, info, warn};
use crate::display::DisplaySink;
use crate::error::AppError;
use crate::generator::backend::{resolve_sampler, SynthesisService, Txt2ImgRequest, Txt2ImgResponse};
use crate::job::{GenerationJob, GenerationOutput, JobOutcome, JobStatus};

/// Runs one generation job on a worker thread while polling the service for
/// preview frames on the calling thread.
pub struct JobCoordinator {
    service: Arc<dyn SynthesisService>,
    poll_interval: Duration,
}

impl JobCoordinator {
    pub fn new(service: Arc<dyn SynthesisService>, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
        }
    }

    pub fn run(&self, job: &mut GenerationJob, display: &mut dyn DisplaySink) -> JobOutcome {
        set_status(job, display, JobStatus::Submitting);

        let sampler = resolve_sampler(self.service.as_ref(), &job.params.sampler);
        let request = Txt2ImgRequest::new(&job.prompt, &job.params, sampler);

        let (result_tx, result_rx) = channel::<Result<Txt2ImgResponse, AppError>>();
        let service = Arc::clone(&self.service);
        let spawned = thread::Builder::new()
            .name("txt2img-worker".into())
            .spawn(move || {
                let result = service.txt2img(&request);
                let _ = result_tx.send(result);
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => return fail(job, display, format!("Failed to spawn worker: {}", e)),
        };

        set_status(job, display, JobStatus::Polling);

        // The worker's message is the only completion signal.
        let result = loop {
            match result_rx.recv_timeout(self.poll_interval) {
                Ok(result) => break Some(result),
                Err(RecvTimeoutError::Timeout) => self.poll_preview(job, display),
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        if handle.join().is_err() {
            return fail(job, display, "Generation worker panicked".into());
        }

        let response = match result {
            Some(Ok(response)) => response,
            Some(Err(e)) => return fail(job, display, format!("Error during image generation: {}", e)),
            None => return fail(job, display, "Worker exited without a result".into()),
        };

        let Some(encoded) = response.images.first() else {
            return fail(job, display, "No image returned in result".into());
        };

        let raw = match decode_payload(encoded) {
            Ok(raw) => raw,
            Err(e) => return fail(job, display, format!("Final image payload is invalid: {}", e)),
        };

        let image = match decode_image(&raw) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Could not decode final image for display: {}", e);
                None
            }
        };

        info!(
            "Generation complete ({} bytes, {} preview frames)",
            raw.len(),
            job.preview_frames
        );
        set_status(job, display, JobStatus::Completed);

        JobOutcome::Completed(GenerationOutput { raw, image })
    }

    fn poll_preview(&self, job: &mut GenerationJob, display: &mut dyn DisplaySink) {
        let progress = match self.service.progress() {
            Ok(progress) => progress,
            Err(e) => {
                warn!("Error fetching progress: {}", e);
                return;
            }
        };

        debug_assert!(job.status.is_active());
        debug!(
            "Progress {:.0}% (step {}/{}, eta {:.1}s) {}",
            progress.progress * 100.0,
            progress.state.sampling_step,
            progress.state.sampling_steps,
            progress.eta_relative,
            progress.textinfo.as_deref().unwrap_or("")
        );
        if progress.state.interrupted {
            warn!("Service reports the current job as interrupted");
        }

        let Some(encoded) = progress.preview() else {
            return;
        };

        let preview = decode_payload(encoded).and_then(|bytes| decode_image(&bytes));
        match preview {
            Ok(frame) => {
                job.preview_frames += 1;
                if let Err(e) = display.show_preview(&frame, progress.progress) {
                    warn!("Could not display preview: {}", e);
                }
            }
            Err(e) => warn!("Error decoding preview: {}", e),
        }
    }
}

fn set_status(job: &mut GenerationJob, display: &mut dyn DisplaySink, status: JobStatus) {
    job.status = status;
    display.show_status(status);
}

fn fail(job: &mut GenerationJob, display: &mut dyn DisplaySink, reason: String) -> JobOutcome {
    error!("{}", reason);
    set_status(job, display, JobStatus::Failed);
    JobOutcome::Failed(reason)
}

/// Base64-decode a service image, tolerating a `data:` URI prefix.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, AppError> {
    let data = match encoded.split_once(";base64,") {
        Some((_, data)) => data,
        None => encoded,
    };

    Ok(STANDARD.decode(data.trim())?)
}

pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, AppError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use image::{ImageFormat, Rgba};
    use cu_core::{GenerationParams, SamplerInfo};
    use crate::generator::backend::ProgressResponse;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 255]));
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    pub(crate) enum Outcome {
        Images(Vec<String>),
        Error,
        Panic,
    }

    /// In-process stand-in for the synthesis service.
    pub(crate) struct MockService {
        pub delay: Duration,
        pub outcome: Outcome,
        pub preview: Option<String>,
        pub progress_fails: bool,
        pub progress_calls: AtomicUsize,
        pub requests: Mutex<Vec<Txt2ImgRequest>>,
    }

    impl MockService {
        pub(crate) fn new(delay: Duration, outcome: Outcome) -> Self {
            Self {
                delay,
                outcome,
                preview: None,
                progress_fails: false,
                progress_calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn with_preview(mut self, preview: &str) -> Self {
            self.preview = Some(preview.to_string());
            self
        }

        pub(crate) fn with_failing_progress(mut self) -> Self {
            self.progress_fails = true;
            self
        }
    }

    impl SynthesisService for MockService {
        fn samplers(&self) -> Result<Vec<SamplerInfo>, AppError> {
            Ok(vec![SamplerInfo { name: "DPM++ 2M Karras".into(), aliases: Vec::new() }])
        }

        fn txt2img(&self, request: &Txt2ImgRequest) -> Result<Txt2ImgResponse, AppError> {
            self.requests.lock().unwrap().push(request.clone());
            thread::sleep(self.delay);
            match &self.outcome {
                Outcome::Images(images) => Ok(Txt2ImgResponse { images: images.clone() }),
                Outcome::Error => Err(AppError::BackendError("HTTP 500: out of memory".into())),
                Outcome::Panic => panic!("worker blew up"),
            }
        }

        fn progress(&self) -> Result<ProgressResponse, AppError> {
            self.progress_calls.fetch_add(1, Ordering::SeqCst);
            if self.progress_fails {
                return Err(AppError::BackendError("HTTP 503: busy".into()));
            }
            Ok(ProgressResponse {
                progress: 0.5,
                current_image: self.preview.clone(),
                ..Default::default()
            })
        }
    }

    /// Records every call the coordinator and main loop make. With `broken`
    /// set, every fallible method still records and then reports an error.
    #[derive(Default)]
    pub(crate) struct RecordingDisplay {
        pub prompts: Vec<String>,
        pub previews: usize,
        pub finals: usize,
        pub saved: usize,
        pub statuses: Vec<JobStatus>,
        pub broken: bool,
    }

    impl RecordingDisplay {
        pub(crate) fn broken() -> Self {
            Self {
                broken: true,
                ..Default::default()
            }
        }

        fn result(&self) -> Result<(), AppError> {
            if self.broken {
                Err(AppError::Display("viewer window is closed".into()))
            } else {
                Ok(())
            }
        }
    }

    impl DisplaySink for RecordingDisplay {
        fn show_prompt(&mut self, prompt: &str) -> Result<(), AppError> {
            self.prompts.push(prompt.to_string());
            self.result()
        }

        fn show_preview(&mut self, _frame: &RgbaImage, _progress: f32) -> Result<(), AppError> {
            self.previews += 1;
            self.result()
        }

        fn show_final(&mut self, _image: &RgbaImage) -> Result<(), AppError> {
            self.finals += 1;
            self.result()
        }

        fn show_status(&mut self, status: JobStatus) {
            self.statuses.push(status);
        }

        fn show_saved(&mut self, _artifact: &crate::generator::writer::Artifact) {
            self.saved += 1;
        }
    }

    fn job() -> GenerationJob {
        GenerationJob::new("A Blender render of x, digital texture.".into(), GenerationParams::default())
    }

    #[test]
    fn test_completed_job_keeps_raw_bytes() {
        let png = png_bytes(8, 6);
        let service = Arc::new(MockService::new(
            Duration::from_millis(10),
            Outcome::Images(vec![STANDARD.encode(&png)]),
        ));
        let coordinator = JobCoordinator::new(service.clone(), Duration::from_millis(50));
        let mut display = RecordingDisplay::default();
        let mut job = job();

        let output = coordinator.run(&mut job, &mut display).output().unwrap();

        assert_eq!(output.raw, png);
        let image = output.image.unwrap();
        assert_eq!(image.dimensions(), (8, 6));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(
            display.statuses,
            vec![JobStatus::Submitting, JobStatus::Polling, JobStatus::Completed]
        );

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].sampler_name, "DPM++ 2M Karras");
        assert!(requests[0].prompt.starts_with("<lora:digital_texture-000008:1.0> "));
    }

    #[test]
    fn test_polling_stops_after_completion() {
        let interval = Duration::from_millis(50);
        let delay = Duration::from_millis(120);
        let preview = STANDARD.encode(png_bytes(2, 2));
        let service = Arc::new(
            MockService::new(delay, Outcome::Images(vec![STANDARD.encode(png_bytes(4, 4))]))
                .with_preview(&preview),
        );
        let coordinator = JobCoordinator::new(service.clone(), interval);
        let mut display = RecordingDisplay::default();
        let mut job = job();

        let start = Instant::now();
        let outcome = coordinator.run(&mut job, &mut display);
        let elapsed = start.elapsed();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert!(elapsed < delay + interval * 4, "took {:?}", elapsed);

        let polls = service.progress_calls.load(Ordering::SeqCst);
        assert!((1..=4).contains(&polls), "polled {} times", polls);
        assert_eq!(display.previews, polls);
        assert_eq!(job.preview_frames, polls);

        thread::sleep(interval * 2);
        assert_eq!(service.progress_calls.load(Ordering::SeqCst), polls);
    }

    #[test]
    fn test_worker_error_fails_job() {
        let service = Arc::new(MockService::new(Duration::ZERO, Outcome::Error));
        let coordinator = JobCoordinator::new(service, Duration::from_millis(20));
        let mut display = RecordingDisplay::default();
        let mut job = job();

        let outcome = coordinator.run(&mut job, &mut display);

        match outcome {
            JobOutcome::Failed(reason) => assert!(reason.contains("out of memory")),
            JobOutcome::Completed(_) => panic!("expected failure"),
        }
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn test_empty_image_list_fails_job() {
        let service = Arc::new(MockService::new(Duration::ZERO, Outcome::Images(Vec::new())));
        let coordinator = JobCoordinator::new(service, Duration::from_millis(20));

        let outcome = coordinator.run(&mut job(), &mut RecordingDisplay::default());
        assert!(matches!(outcome, JobOutcome::Failed(reason) if reason.contains("No image")));
    }

    #[test]
    fn test_worker_panic_fails_job() {
        let service = Arc::new(MockService::new(Duration::ZERO, Outcome::Panic));
        let coordinator = JobCoordinator::new(service, Duration::from_millis(20));

        let outcome = coordinator.run(&mut job(), &mut RecordingDisplay::default());
        assert!(matches!(outcome, JobOutcome::Failed(_)));
    }

    #[test]
    fn test_bad_preview_does_not_abort() {
        let service = Arc::new(
            MockService::new(
                Duration::from_millis(80),
                Outcome::Images(vec![STANDARD.encode(png_bytes(4, 4))]),
            )
            .with_preview("@@not base64@@"),
        );
        let coordinator = JobCoordinator::new(service.clone(), Duration::from_millis(20));
        let mut display = RecordingDisplay::default();

        let outcome = coordinator.run(&mut job(), &mut display);

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert!(service.progress_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(display.previews, 0);
    }

    #[test]
    fn test_progress_errors_do_not_abort() {
        let service = Arc::new(
            MockService::new(
                Duration::from_millis(100),
                Outcome::Images(vec![STANDARD.encode(png_bytes(4, 4))]),
            )
            .with_failing_progress(),
        );
        let coordinator = JobCoordinator::new(service.clone(), Duration::from_millis(20));
        let mut display = RecordingDisplay::default();
        let mut job = job();

        let outcome = coordinator.run(&mut job, &mut display);

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(job.status, JobStatus::Completed);
        assert!(service.progress_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(display.previews, 0);
    }

    #[test]
    fn test_undecodable_final_image_is_still_kept() {
        let service = Arc::new(MockService::new(
            Duration::ZERO,
            Outcome::Images(vec![STANDARD.encode(b"PNGDATA")]),
        ));
        let coordinator = JobCoordinator::new(service, Duration::from_millis(20));

        let output = coordinator
            .run(&mut job(), &mut RecordingDisplay::default())
            .output()
            .unwrap();
        assert_eq!(output.raw, b"PNGDATA");
        assert!(output.image.is_none());
    }

    #[test]
    fn test_decode_payload_accepts_data_uri() {
        let encoded = format!("data:image/png;base64,{}", STANDARD.encode(b"abc"));
        assert_eq!(decode_payload(&encoded).unwrap(), b"abc");
        assert!(decode_payload("%%%").is_err());
    }
}
