// Unit tests for preset resolution rules

use super::*;
use crate::domain::errors::PipelineError;

#[test]
fn test_all_presets_resolve_to_allowed_container() {
    for preset in PresetResolver::presets() {
        let params = PresetResolver::resolve(preset.name, None, None).unwrap();
        assert!(
            preset.allowed_formats.contains(&params.container.as_str()),
            "preset {} resolved to container {} outside its allowed formats",
            preset.name,
            params.container
        );
    }
}

#[test]
fn test_unknown_preset_fails() {
    let err = PresetResolver::resolve("nonexistent", None, None).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidPreset { .. }));
    assert_eq!(err.code(), "InvalidPreset");
}

#[test]
fn test_format_override_changes_only_that_axis() {
    let default = PresetResolver::resolve("web", None, None).unwrap();
    assert_eq!(default.container, "mp4");
    assert_eq!(default.video_codec, "h264");

    let webm = PresetResolver::resolve("web", Some("webm"), None).unwrap();
    assert_eq!(webm.container, "webm");
    // codec falls back to the container default, not the preset default
    assert_eq!(webm.video_codec, "vp9");
}

#[test]
fn test_codec_override() {
    let params = PresetResolver::resolve("web", Some("mp4"), Some("h265")).unwrap();
    assert_eq!(params.container, "mp4");
    assert_eq!(params.video_codec, "h265");
    // non-h264 codecs get the relaxed CRF
    assert_eq!(params.video.get("crf").unwrap(), "28");
}

#[test]
fn test_incompatible_codec_fails() {
    let err = PresetResolver::resolve("web", Some("mp4"), Some("prores")).unwrap_err();
    assert!(matches!(err, PipelineError::IncompatibleCodec { .. }));
    assert_eq!(err.code(), "IncompatibleCodec");
}

#[test]
fn test_disallowed_format_for_preset_fails() {
    let err = PresetResolver::resolve("social", Some("mkv"), None).unwrap_err();
    assert!(matches!(err, PipelineError::MalformedRequest { .. }));
}

#[test]
fn test_preset_name_is_case_insensitive() {
    let params = PresetResolver::resolve("WEB", None, None).unwrap();
    assert_eq!(params.container, "mp4");
}

#[test]
fn test_web_preset_parameters() {
    let params = PresetResolver::resolve("web", None, None).unwrap();
    assert_eq!(params.video.get("crf").unwrap(), "23");
    assert_eq!(params.video.get("preset").unwrap(), "medium");
    assert_eq!(params.video.get("movflags").unwrap(), "+faststart");
    assert_eq!(params.audio.get("codec").unwrap(), "aac");
    assert_eq!(params.audio.get("bitrate").unwrap(), "128k");
    assert!(params.extra_args.is_empty());
}

#[test]
fn test_broadcast_prores_parameters() {
    let params = PresetResolver::resolve("broadcast", None, None).unwrap();
    assert_eq!(params.container, "mov");
    assert_eq!(params.video_codec, "prores");
    assert_eq!(params.video.get("profile").unwrap(), "3");
    assert_eq!(params.video.get("pix_fmt").unwrap(), "yuv422p10le");
    assert_eq!(params.audio.get("codec").unwrap(), "pcm_s24le");
    assert_eq!(params.audio.get("sample_rate").unwrap(), "48000");
}

#[test]
fn test_broadcast_h264_parameters() {
    let params = PresetResolver::resolve("broadcast", Some("mov"), Some("h264")).unwrap();
    assert_eq!(params.video.get("profile").unwrap(), "high");
    assert_eq!(params.video.get("level").unwrap(), "5.1");
    assert_eq!(params.video.get("preset").unwrap(), "slow");
}

#[test]
fn test_archive_parameters() {
    let params = PresetResolver::resolve("archive", None, None).unwrap();
    assert_eq!(params.video.get("profile").unwrap(), "4444");
    assert_eq!(params.video.get("pix_fmt").unwrap(), "yuv444p10le");
    assert_eq!(params.audio.get("codec").unwrap(), "pcm_s24le");
}

#[test]
fn test_default_codec_per_container() {
    assert_eq!(PresetResolver::default_codec("mp4"), "h264");
    assert_eq!(PresetResolver::default_codec("webm"), "vp9");
    assert_eq!(PresetResolver::default_codec("mov"), "prores");
    assert_eq!(PresetResolver::default_codec("mkv"), "h265");
}

#[test]
fn test_codec_compatibility_matrix() {
    assert!(PresetResolver::codec_compatible("mp4", "h264"));
    assert!(PresetResolver::codec_compatible("mp4", "av1"));
    assert!(!PresetResolver::codec_compatible("mp4", "prores"));
    assert!(PresetResolver::codec_compatible("webm", "vp9"));
    assert!(!PresetResolver::codec_compatible("webm", "h264"));
    assert!(!PresetResolver::codec_compatible("unknown", "h264"));
}
