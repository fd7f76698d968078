//! FFmpeg-backed encode executor

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::{MediaMetadata, ParameterSet};
use crate::ports::EncodeEngine;

/// Maximum stderr tail preserved in failure messages
const STDERR_TAIL_BYTES: usize = 1024;

/// Invokes ffmpeg as a child process with a wall-clock timeout. A failed or
/// timed-out run removes any partial output before returning.
pub struct FfmpegEngine {
    ffmpeg_bin: PathBuf,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }

    /// ffmpeg encoder name for a codec
    pub fn encoder_name(codec: &str) -> &str {
        match codec {
            "h264" => "libx264",
            "h265" | "hevc" => "libx265",
            "prores" => "prores_ks",
            "av1" => "libaom-av1",
            "vp9" => "libvpx-vp9",
            other => other,
        }
    }

    /// ffmpeg muxer name for a container format
    pub fn muxer_name(container: &str) -> &str {
        match container {
            "mkv" => "matroska",
            other => other,
        }
    }

    /// Build the ffmpeg argument list for a parameter set. Video and audio
    /// options are only emitted when the source carries that stream type.
    pub fn build_args(
        input: &Path,
        output: &Path,
        params: &ParameterSet,
        source: &MediaMetadata,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-i".into(),
            input.display().to_string(),
        ];

        if source.has_video() {
            args.push("-c:v".into());
            args.push(Self::encoder_name(&params.video_codec).into());

            let h26x = matches!(params.video_codec.as_str(), "h264" | "h265" | "hevc");
            for (key, value) in &params.video {
                match key.as_str() {
                    "crf" => {
                        args.push("-crf".into());
                        args.push(value.clone());
                    }
                    "preset" => {
                        args.push("-preset".into());
                        args.push(value.clone());
                    }
                    "profile" => {
                        args.push("-profile:v".into());
                        args.push(value.clone());
                    }
                    "level" if h26x => {
                        args.push("-level".into());
                        args.push(value.clone());
                    }
                    "pix_fmt" => {
                        args.push("-pix_fmt".into());
                        args.push(value.clone());
                    }
                    "maxrate" => {
                        args.push("-maxrate".into());
                        args.push(value.clone());
                    }
                    "minrate" => {
                        args.push("-minrate".into());
                        args.push(value.clone());
                    }
                    "bufsize" => {
                        args.push("-bufsize".into());
                        args.push(value.clone());
                    }
                    "qscale" => {
                        args.push("-qscale:v".into());
                        args.push(value.clone());
                    }
                    "bitrate" => {
                        args.push("-b:v".into());
                        args.push(value.clone());
                    }
                    "movflags" if matches!(params.container.as_str(), "mp4" | "mov") => {
                        args.push("-movflags".into());
                        args.push(value.clone());
                    }
                    _ => {}
                }
            }
        }

        if source.has_audio() {
            for (key, value) in &params.audio {
                match key.as_str() {
                    "codec" => {
                        args.push("-c:a".into());
                        args.push(value.clone());
                    }
                    "bitrate" => {
                        args.push("-b:a".into());
                        args.push(value.clone());
                    }
                    "sample_rate" => {
                        args.push("-ar".into());
                        args.push(value.clone());
                    }
                    "channels" => {
                        args.push("-ac".into());
                        args.push(value.clone());
                    }
                    _ => {}
                }
            }
        }

        args.extend(params.extra_args.iter().cloned());

        args.push("-f".into());
        args.push(Self::muxer_name(&params.container).into());
        args.push(output.display().to_string());

        args
    }

    /// Remove a partial output; nothing downstream may ever see it
    async fn discard_partial(output: &Path) {
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!(output = %output.display(), "Discarded partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                output = %output.display(),
                error = %e,
                "Failed to discard partial output"
            ),
        }
    }
}

#[async_trait]
impl EncodeEngine for FfmpegEngine {
    async fn execute(
        &self,
        input: &Path,
        output: &Path,
        params: &ParameterSet,
        source: &MediaMetadata,
        timeout: Duration,
    ) -> PipelineResult<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = Self::build_args(input, output, params, source);
        info!(
            ffmpeg = %self.ffmpeg_bin.display(),
            args = %args.join(" "),
            "Invoking codec engine"
        );

        let child = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PipelineError::EncodeFailure {
                exit_code: None,
                message: format!("Failed to spawn codec engine: {}", e),
            })?;

        // Dropping the wait future on timeout kills the child via kill_on_drop
        let waited = tokio::time::timeout(timeout, child.wait_with_output()).await;

        let output_result = match waited {
            Ok(result) => result.map_err(|e| PipelineError::EncodeFailure {
                exit_code: None,
                message: format!("Failed to wait for codec engine: {}", e),
            }),
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "Codec engine exceeded wall-clock budget, terminated"
                );
                Self::discard_partial(output).await;
                return Err(PipelineError::EncodeTimeout {
                    seconds: timeout.as_secs(),
                });
            }
        };

        let process_output = match output_result {
            Ok(process_output) => process_output,
            Err(e) => {
                Self::discard_partial(output).await;
                return Err(e);
            }
        };

        if !process_output.status.success() {
            let stderr = String::from_utf8_lossy(&process_output.stderr);
            let mut tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            while !stderr.is_char_boundary(tail_start) {
                tail_start += 1;
            }
            let tail = &stderr[tail_start..];
            Self::discard_partial(output).await;
            return Err(PipelineError::EncodeFailure {
                exit_code: process_output.status.code(),
                message: tail.trim().to_string(),
            });
        }

        debug!(output = %output.display(), "Codec engine finished");
        Ok(())
    }
}
