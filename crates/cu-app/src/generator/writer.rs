use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};
use crate::error::AppError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Paths of one persisted generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub image_path: PathBuf,
    pub prompt_path: PathBuf,
}

/// Persists final images next to a text record of their prompt.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, image: &[u8], prompt: &str) -> Result<Artifact, AppError> {
        self.write_at(image, prompt, Local::now())
    }

    /// Write `image` untouched as `generated_<timestamp>.png` and the prompt
    /// as `generated_<timestamp>.txt`.
    pub fn write_at<Tz: TimeZone>(
        &self,
        image: &[u8],
        prompt: &str,
        at: DateTime<Tz>,
    ) -> Result<Artifact, AppError>
    where
        Tz::Offset: std::fmt::Display,
    {
        fs::create_dir_all(&self.dir).map_err(|source| AppError::Persist {
            path: self.dir.clone(),
            source,
        })?;

        let stem = format!("generated_{}", at.format(TIMESTAMP_FORMAT));
        let image_path = self.dir.join(format!("{stem}.png"));
        let prompt_path = self.dir.join(format!("{stem}.txt"));

        fs::write(&image_path, image).map_err(|source| AppError::Persist {
            path: image_path.clone(),
            source,
        })?;
        if let Err(source) = fs::write(&prompt_path, format!("Prompt: {prompt}\n")) {
            // An image without its prompt record is not an artifact.
            if let Err(e) = fs::remove_file(&image_path) {
                warn!("Could not remove {}: {}", image_path.display(), e);
            }
            return Err(AppError::Persist {
                path: prompt_path,
                source,
            });
        }

        info!("Saved image with metadata: {}", image_path.display());
        info!("Saved prompt metadata: {}", prompt_path.display());

        Ok(Artifact { image_path, prompt_path })
    }
}
