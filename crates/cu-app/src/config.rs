use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use cu_core::{GenerationParams, StyleModifier};
use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:7860";

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_url: String,
    pub corpus_path: PathBuf,
    pub output_dir: PathBuf,
    pub params: GenerationParams,
    pub poll_interval: Duration,
    pub progress_timeout: Duration,
    pub final_hold: Duration,
    pub font_path: PathBuf,
    pub max_iterations: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            corpus_path: PathBuf::from("text_bank.txt"),
            output_dir: PathBuf::from("generated_images"),
            params: GenerationParams::default(),
            poll_interval: Duration::from_millis(500),
            progress_timeout: Duration::from_secs(10),
            final_hold: Duration::from_millis(1000),
            font_path: PathBuf::from("WorkSans-Medium.ttf"),
            max_iterations: None,
        }
    }
}

impl GeneratorConfig {
    /// Load from the process environment, after applying `env_file` if it
    /// exists.
    pub fn load(env_file: Option<&Path>) -> anyhow::Result<Self> {
        let path = env_file.unwrap_or(Path::new(".env"));
        match dotenvy::from_path(path) {
            Ok(()) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No env file at {}", path.display()),
            Err(e) => return Err(e.into()),
        }

        Ok(Self::from_lookup(|key| env::var(key).ok())?)
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let default_style = StyleModifier::default();

        let style = match lookup("CUTUP_LORA") {
            Some(lora) if lora.trim().is_empty() => None,
            lora => Some(StyleModifier {
                lora: lora.unwrap_or(default_style.lora),
                weight: parse_var(&lookup, "CUTUP_LORA_WEIGHT", default_style.weight)?,
            }),
        };

        let poll_ms: u64 = parse_var(&lookup, "CUTUP_POLL_MS", 500)?;
        if poll_ms == 0 {
            return Err(AppError::Config("CUTUP_POLL_MS must be greater than zero".into()));
        }
        let poll_interval = Duration::from_millis(poll_ms);

        let params = GenerationParams {
            steps: parse_var(&lookup, "CUTUP_STEPS", defaults.params.steps)?,
            width: parse_var(&lookup, "CUTUP_WIDTH", defaults.params.width)?,
            height: parse_var(&lookup, "CUTUP_HEIGHT", defaults.params.height)?,
            sampler: lookup("CUTUP_SAMPLER").unwrap_or(defaults.params.sampler),
            scheduler: lookup("CUTUP_SCHEDULER").unwrap_or(defaults.params.scheduler),
            cfg_scale: parse_var(&lookup, "CUTUP_CFG_SCALE", defaults.params.cfg_scale)?,
            seed: parse_var(&lookup, "CUTUP_SEED", defaults.params.seed)?,
            style,
            ..defaults.params
        };

        Ok(Self {
            api_url: lookup("CUTUP_API_URL").unwrap_or(defaults.api_url),
            corpus_path: lookup("CUTUP_CORPUS").map(PathBuf::from).unwrap_or(defaults.corpus_path),
            output_dir: lookup("CUTUP_OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            params,
            poll_interval,
            progress_timeout: Duration::from_secs(parse_var(&lookup, "CUTUP_PROGRESS_TIMEOUT_SECS", 10)?),
            final_hold: Duration::from_millis(parse_var(&lookup, "CUTUP_FINAL_HOLD_MS", 1000)?),
            font_path: lookup("CUTUP_FONT").map(PathBuf::from).unwrap_or(defaults.font_path),
            max_iterations: None,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.params, GenerationParams::default());
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.output_dir, PathBuf::from("generated_images"));
    }

    #[test]
    fn test_overrides() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[
            ("CUTUP_API_URL", "http://gpu-box:7860"),
            ("CUTUP_STEPS", "20"),
            ("CUTUP_SAMPLER", "euler a"),
            ("CUTUP_LORA_WEIGHT", "0.5"),
            ("CUTUP_POLL_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://gpu-box:7860");
        assert_eq!(config.params.steps, 20);
        assert_eq!(config.params.sampler, "euler a");
        assert_eq!(config.params.style.as_ref().map(|s| s.weight), Some(0.5));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_blank_lora_disables_style() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[("CUTUP_LORA", "")])).unwrap();
        assert!(config.params.style.is_none());
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = GeneratorConfig::from_lookup(lookup_from(&[("CUTUP_WIDTH", "wide")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let err = GeneratorConfig::from_lookup(lookup_from(&[("CUTUP_POLL_MS", "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("CUTUP_POLL_MS")));
    }
}
