mod schemas;

use std::time::Duration;
use reqwest::blocking::{Client, Response};
use tracing::{debug, warn};
use cu_core::{resolve_sampler_name, SamplerInfo};
use crate::error::AppError;

pub use schemas::{ProgressResponse, Txt2ImgRequest, Txt2ImgResponse};

/// The remote image-synthesis service.
///
/// Implementations must be shareable with the per-job worker thread.
pub trait SynthesisService: Send + Sync {
    fn samplers(&self) -> Result<Vec<SamplerInfo>, AppError>;

    /// Run a full generation. Blocks until the service answers.
    fn txt2img(&self, request: &Txt2ImgRequest) -> Result<Txt2ImgResponse, AppError>;

    fn progress(&self) -> Result<ProgressResponse, AppError>;
}

/// Client for an AUTOMATIC1111-compatible `sdapi/v1` endpoint.
pub struct SdApiClient {
    client: Client,
    base_url: String,
    progress_timeout: Duration,
}

impl SdApiClient {
    pub fn new(base_url: impl Into<String>, progress_timeout: Duration) -> Result<Self, AppError> {
        // txt2img runs for as long as sampling takes, so no global timeout.
        let client = Client::builder().timeout(None::<Duration>).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            progress_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/sdapi/v1/{}", self.base_url, path)
    }

    fn check(response: Response) -> Result<Response, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(AppError::BackendError(format!("HTTP {}: {}", status, body)));
        }

        Ok(response)
    }
}

impl SynthesisService for SdApiClient {
    fn samplers(&self) -> Result<Vec<SamplerInfo>, AppError> {
        let response = self
            .client
            .get(self.url("samplers"))
            .timeout(self.progress_timeout)
            .send()?;

        Ok(Self::check(response)?.json()?)
    }

    fn txt2img(&self, request: &Txt2ImgRequest) -> Result<Txt2ImgResponse, AppError> {
        debug!("POST txt2img ({} steps, {}x{})", request.steps, request.width, request.height);

        let response = self
            .client
            .post(self.url("txt2img"))
            .json(request)
            .send()?;

        Ok(Self::check(response)?.json()?)
    }

    fn progress(&self) -> Result<ProgressResponse, AppError> {
        let response = self
            .client
            .get(self.url("progress?skip_current_image=false"))
            .timeout(self.progress_timeout)
            .send()?;

        Ok(Self::check(response)?.json()?)
    }
}

/// Normalize `desired` to the service's spelling. Falls back to `desired`
/// when the service is unreachable or does not advertise it.
pub fn resolve_sampler(service: &dyn SynthesisService, desired: &str) -> String {
    match service.samplers() {
        Ok(samplers) => match resolve_sampler_name(desired, &samplers) {
            Some(name) => name.to_string(),
            None => {
                warn!("Sampler '{}' not found. Using '{}' as given.", desired, desired);
                desired.to_string()
            }
        },
        Err(e) => {
            warn!("Error fetching samplers: {}", e);
            desired.to_string()
        }
    }
}
