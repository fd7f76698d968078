// Domain rules - Preset resolution and codec compatibility policies

use std::collections::BTreeMap;

use crate::domain::errors::PipelineError;
use crate::domain::model::{ParameterSet, Preset};

#[cfg(test)]
mod tests;

/// Available quality presets, in display order
const PRESETS: &[Preset] = &[
    Preset {
        name: "web",
        description: "Streaming-friendly output with fast start",
        allowed_formats: &["mp4", "webm"],
        default_format: "mp4",
    },
    Preset {
        name: "social",
        description: "Capped-bitrate output for social platforms",
        allowed_formats: &["mp4"],
        default_format: "mp4",
    },
    Preset {
        name: "broadcast",
        description: "High-profile output for broadcast delivery",
        allowed_formats: &["mov", "mxf"],
        default_format: "mov",
    },
    Preset {
        name: "archive",
        description: "Near-lossless output for archival masters",
        allowed_formats: &["mov", "mkv"],
        default_format: "mov",
    },
    Preset {
        name: "mobile",
        description: "Small output tuned for mobile playback",
        allowed_formats: &["mp4"],
        default_format: "mp4",
    },
    Preset {
        name: "standard",
        description: "Balanced default conversion",
        allowed_formats: &["mp4", "mov", "mkv", "webm"],
        default_format: "mp4",
    },
];

/// Pure resolver from preset name + optional overrides to a concrete
/// parameter set. No I/O, no side effects.
pub struct PresetResolver;

impl PresetResolver {
    /// All known presets
    pub fn presets() -> &'static [Preset] {
        PRESETS
    }

    /// Look up a preset by name
    pub fn find(name: &str) -> Option<&'static Preset> {
        let name = name.to_lowercase();
        PRESETS.iter().find(|preset| preset.name == name)
    }

    /// Resolve a preset into a fully-specified parameter set. Explicit
    /// format/codec override the preset default for that axis only.
    pub fn resolve(
        preset_name: &str,
        format_override: Option<&str>,
        codec_override: Option<&str>,
    ) -> Result<ParameterSet, PipelineError> {
        let preset = Self::find(preset_name).ok_or_else(|| PipelineError::InvalidPreset {
            name: preset_name.to_string(),
        })?;

        let container = format_override
            .map(|format| format.to_lowercase())
            .unwrap_or_else(|| preset.default_format.to_string());

        if !preset
            .allowed_formats
            .iter()
            .any(|allowed| *allowed == container)
        {
            return Err(PipelineError::MalformedRequest {
                message: format!(
                    "Format {} is not allowed for preset {} (allowed: {})",
                    container,
                    preset.name,
                    preset.allowed_formats.join(", ")
                ),
            });
        }

        let codec = codec_override
            .map(|codec| codec.to_lowercase())
            .unwrap_or_else(|| Self::default_codec(&container).to_string());

        if !Self::codec_compatible(&container, &codec) {
            return Err(PipelineError::IncompatibleCodec {
                codec,
                container,
            });
        }

        let (video, audio) = Self::preset_parameters(preset.name, &container, &codec);

        Ok(ParameterSet {
            container,
            video_codec: codec,
            video,
            audio,
            extra_args: Vec::new(),
        })
    }

    /// Default video codec for a container
    pub fn default_codec(container: &str) -> &'static str {
        match container {
            "mp4" => "h264",
            "mov" => "prores",
            "mkv" => "h265",
            "webm" => "vp9",
            "avi" => "h264",
            "mxf" => "dnxhd",
            _ => "h264",
        }
    }

    /// Whether a codec can be muxed into a container
    pub fn codec_compatible(container: &str, codec: &str) -> bool {
        let allowed: &[&str] = match container {
            "mp4" => &["h264", "h265", "hevc", "av1"],
            "mov" => &["prores", "h264", "h265", "hevc", "mjpeg", "dnxhd"],
            "mkv" => &["h264", "h265", "hevc", "av1", "vp9", "mjpeg"],
            "webm" => &["vp9", "av1"],
            "avi" => &["h264", "mjpeg"],
            "mxf" => &["dnxhd", "prores"],
            _ => return false,
        };
        allowed.contains(&codec)
    }

    /// Per-preset default encoder options. Values mirror the preset quality
    /// targets: CRF is relaxed for non-h264 codecs, broadcast and archive
    /// pin pixel formats and sample rates.
    fn preset_parameters(
        preset: &str,
        container: &str,
        codec: &str,
    ) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
        let mut video = BTreeMap::new();
        let mut audio = BTreeMap::new();
        let h264 = codec == "h264";
        let h26x = matches!(codec, "h264" | "h265" | "hevc");

        match preset {
            "web" => {
                video.insert("crf".into(), if h264 { "23" } else { "28" }.into());
                video.insert("preset".into(), "medium".into());
                video.insert("movflags".into(), "+faststart".into());
                audio.insert("codec".into(), "aac".into());
                audio.insert("bitrate".into(), "128k".into());
            }
            "social" => {
                video.insert("crf".into(), if h264 { "20" } else { "25" }.into());
                video.insert("preset".into(), "medium".into());
                video.insert("movflags".into(), "+faststart".into());
                video.insert("maxrate".into(), "4M".into());
                video.insert("bufsize".into(), "8M".into());
                audio.insert("codec".into(), "aac".into());
                audio.insert("bitrate".into(), "192k".into());
            }
            "broadcast" => {
                if codec == "prores" {
                    video.insert("profile".into(), "3".into());
                    video.insert("pix_fmt".into(), "yuv422p10le".into());
                } else {
                    video.insert("profile".into(), "high".into());
                    video.insert("pix_fmt".into(), "yuv420p".into());
                }
                if h264 {
                    video.insert("level".into(), "5.1".into());
                }
                if h26x {
                    video.insert("preset".into(), "slow".into());
                }
                let pcm = matches!(container, "mov" | "mxf");
                audio.insert(
                    "codec".into(),
                    if pcm { "pcm_s24le" } else { "aac" }.into(),
                );
                audio.insert("sample_rate".into(), "48000".into());
            }
            "archive" => {
                if codec == "prores" {
                    video.insert("profile".into(), "4444".into());
                    video.insert("pix_fmt".into(), "yuv444p10le".into());
                } else {
                    video.insert("profile".into(), "high".into());
                    video.insert("pix_fmt".into(), "yuv420p".into());
                }
                if codec == "mjpeg" {
                    video.insert("qscale".into(), "1".into());
                }
                audio.insert("codec".into(), "pcm_s24le".into());
                audio.insert("sample_rate".into(), "48000".into());
            }
            "mobile" => {
                video.insert("crf".into(), if h264 { "26" } else { "30" }.into());
                video.insert("preset".into(), "medium".into());
                video.insert("movflags".into(), "+faststart".into());
                video.insert("maxrate".into(), "2M".into());
                video.insert("bufsize".into(), "4M".into());
                audio.insert("codec".into(), "aac".into());
                audio.insert("bitrate".into(), "96k".into());
            }
            _ => {
                // standard
                video.insert("crf".into(), if h264 { "23" } else { "28" }.into());
                video.insert("preset".into(), "medium".into());
                audio.insert("codec".into(), "aac".into());
                audio.insert("bitrate".into(), "192k".into());
            }
        }

        (video, audio)
    }
}
