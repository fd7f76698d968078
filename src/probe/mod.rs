//! Media probing - technical metadata via ffprobe

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::{MediaMetadata, Resolution};
use crate::ports::MediaProber;

/// Complete ffprobe output structure
#[derive(Debug, Clone, Deserialize)]
pub struct FfprobeData {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

/// Format-level metadata from ffprobe
#[derive(Debug, Clone, Deserialize)]
pub struct FfprobeFormat {
    pub format_name: String,
    pub duration: Option<String>,
    pub size: Option<String>,
    pub bit_rate: Option<String>,
}

/// Stream-level metadata from ffprobe
#[derive(Debug, Clone, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bit_rate: Option<String>,
}

impl FfprobeData {
    /// First stream of the given codec type
    fn first_stream(&self, codec_type: &str) -> Option<&FfprobeStream> {
        self.streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some(codec_type))
    }

    /// Flatten the raw probe output into the domain metadata type
    pub fn into_metadata(self) -> MediaMetadata {
        let video = self.first_stream("video");
        let resolution = video.and_then(|stream| match (stream.width, stream.height) {
            (Some(width), Some(height)) => Some(Resolution { width, height }),
            _ => None,
        });
        let video_codec = video.and_then(|stream| stream.codec_name.clone());
        let audio_codec = self
            .first_stream("audio")
            .and_then(|stream| stream.codec_name.clone());

        MediaMetadata {
            format_name: self.format.format_name.clone(),
            duration_secs: self
                .format
                .duration
                .as_deref()
                .and_then(|value| value.parse().ok())
                .unwrap_or(0.0),
            size_bytes: self
                .format
                .size
                .as_deref()
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
            bit_rate: self
                .format
                .bit_rate
                .as_deref()
                .and_then(|value| value.parse().ok()),
            video_codec,
            audio_codec,
            resolution,
        }
    }
}

/// ffprobe-backed implementation of the `MediaProber` port
pub struct FfprobeProber {
    ffprobe_bin: PathBuf,
}

impl FfprobeProber {
    pub fn new(ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    /// Run ffprobe and parse its JSON output
    async fn run_ffprobe(&self, path: &Path) -> PipelineResult<FfprobeData> {
        if !path.exists() {
            return Err(PipelineError::ProbeFailure {
                message: format!("File does not exist: {}", path.display()),
            });
        }

        debug!(file = %path.display(), "Running ffprobe");

        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| PipelineError::ProbeFailure {
                message: format!("Failed to spawn ffprobe: {}", e),
            })?;

        if !output.status.success() {
            return Err(PipelineError::ProbeFailure {
                message: format!(
                    "ffprobe exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| PipelineError::ProbeFailure {
            message: format!("Invalid ffprobe output: {}", e),
        })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> PipelineResult<MediaMetadata> {
        let data = self.run_ffprobe(path).await?;
        Ok(data.into_metadata())
    }
}
