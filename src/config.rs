//! Pipeline configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::{PipelineError, PipelineResult};

/// Configuration for the normalization pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Path to the ffmpeg binary
    pub ffmpeg_bin: PathBuf,
    /// Path to the ffprobe binary
    pub ffprobe_bin: PathBuf,
    /// Scratch directory for fetched sources and in-flight outputs
    pub work_dir: PathBuf,
    /// Root directory of the local artifact store
    pub artifact_root: PathBuf,
    /// Wall-clock budget for one encode in seconds
    pub encode_timeout_secs: u64,
    /// Advisor service endpoint; advisor calls degrade to baseline when unset
    pub advisor_endpoint: Option<String>,
    /// Time budget for one advisor call in seconds
    pub advisor_timeout_secs: u64,
    /// Maximum attempts for transient operations (fetch, persistence)
    pub retry_attempts: u32,
    /// Base delay for exponential backoff between retries
    pub retry_base_delay_ms: u64,
    /// When true, a failing validation report terminates the job as failed
    /// instead of completing with `validation.passed = false`
    pub validation_blocking: bool,
    /// Allowed absolute drift between source and output duration
    pub duration_tolerance_secs: f64,
    /// Number of concurrent pipeline workers
    pub workers: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            work_dir: std::env::temp_dir().join("formatnorm"),
            artifact_root: PathBuf::from("artifacts"),
            encode_timeout_secs: 600,
            advisor_endpoint: None,
            advisor_timeout_secs: 30,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            validation_blocking: false,
            duration_tolerance_secs: 1.0,
            workers: num_cpus::get(),
        }
    }
}

impl NormalizerConfig {
    /// Load configuration from a TOML file, or return defaults when no path
    /// is given or the file does not exist
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let config = match path {
            Some(config_path) if config_path.exists() => {
                let content =
                    std::fs::read_to_string(config_path).map_err(|e| PipelineError::Config {
                        message: format!(
                            "Failed to read config file {}: {}",
                            config_path.display(),
                            e
                        ),
                    })?;
                toml::from_str(&content).map_err(|e| PipelineError::Config {
                    message: format!(
                        "Failed to parse config file {}: {}",
                        config_path.display(),
                        e
                    ),
                })?
            }
            _ => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot run a pipeline
    pub fn validate(&self) -> PipelineResult<()> {
        if self.ffmpeg_bin.as_os_str().is_empty() || self.ffprobe_bin.as_os_str().is_empty() {
            return Err(PipelineError::Config {
                message: "ffmpeg_bin and ffprobe_bin must not be empty".to_string(),
            });
        }
        if self.encode_timeout_secs == 0 {
            return Err(PipelineError::Config {
                message: "encode_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.advisor_timeout_secs == 0 {
            return Err(PipelineError::Config {
                message: "advisor_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.workers == 0 {
            return Err(PipelineError::Config {
                message: "workers must be greater than zero".to_string(),
            });
        }
        if self.duration_tolerance_secs < 0.0 {
            return Err(PipelineError::Config {
                message: "duration_tolerance_secs cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}
