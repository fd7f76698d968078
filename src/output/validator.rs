//! Output validation implementation

use tracing::{info, warn};

use crate::domain::model::{MediaMetadata, ParameterSet, ValidationReport};

/// Output size below this fraction of the source is flagged as suspicious
const SUSPICIOUS_SIZE_RATIO: f64 = 0.01;

/// Resolution loss beyond this fraction of source pixels is flagged
const RESOLUTION_LOSS_RATIO: f64 = 0.10;

/// Checks a produced artifact's probed metadata against the request's
/// expectations. Pure given the metadata; issue order is stable.
pub struct OutputValidator {
    duration_tolerance_secs: f64,
}

impl OutputValidator {
    pub fn new(duration_tolerance_secs: f64) -> Self {
        Self {
            duration_tolerance_secs,
        }
    }

    /// Validate the output against the source and the final parameter set
    pub fn validate(
        &self,
        source: &MediaMetadata,
        output: &MediaMetadata,
        params: &ParameterSet,
    ) -> ValidationReport {
        let mut report = ValidationReport::passing();

        self.check_container(output, params, &mut report);
        self.check_video_codec(output, params, &mut report);
        self.check_audio_codec(output, params, &mut report);
        self.check_resolution(source, output, &mut report);
        self.check_size(source, output, &mut report);
        self.check_duration(source, output, &mut report);

        if report.passed {
            info!(format = %params.container, "Output validation passed");
        } else {
            warn!(issues = ?report.issues, "Output validation failed");
        }

        report
    }

    fn check_container(
        &self,
        output: &MediaMetadata,
        params: &ParameterSet,
        report: &mut ValidationReport,
    ) {
        // Probers report mkv containers as "matroska"
        let matches = output.matches_format(&params.container)
            || (params.container == "mkv" && output.matches_format("matroska"));
        if !matches {
            report.passed = false;
            report.issues.push(format!(
                "Expected format {}, got {}",
                params.container, output.format_name
            ));
        }
    }

    fn check_video_codec(
        &self,
        output: &MediaMetadata,
        params: &ParameterSet,
        report: &mut ValidationReport,
    ) {
        let Some(output_codec) = output.video_codec.as_deref() else {
            return;
        };
        let expected = params.video_codec.as_str();
        let accepted: &[&str] = match expected {
            "h264" => &["h264"],
            "h265" | "hevc" => &["h265", "hevc"],
            "vp9" => &["vp9"],
            "av1" => &["av1"],
            "prores" => &["prores"],
            other => {
                if !output_codec.eq_ignore_ascii_case(other) {
                    report.passed = false;
                    report.issues.push(format!(
                        "Expected video codec {}, got {}",
                        other, output_codec
                    ));
                }
                return;
            }
        };
        if !accepted.contains(&output_codec.to_lowercase().as_str()) {
            report.passed = false;
            report.issues.push(format!(
                "Expected video codec {}, got {}",
                expected, output_codec
            ));
        }
    }

    fn check_audio_codec(
        &self,
        output: &MediaMetadata,
        params: &ParameterSet,
        report: &mut ValidationReport,
    ) {
        let (Some(output_codec), Some(expected)) =
            (output.audio_codec.as_deref(), params.audio.get("codec"))
        else {
            return;
        };
        let output_codec = output_codec.to_lowercase();
        let expected = expected.to_lowercase();
        // aac encoders report the aac_lc profile
        let equivalent = expected == "aac" && matches!(output_codec.as_str(), "aac" | "aac_lc");
        if output_codec != expected && !equivalent {
            report.passed = false;
            report.issues.push(format!(
                "Expected audio codec {}, got {}",
                expected, output_codec
            ));
        }
    }

    fn check_resolution(
        &self,
        source: &MediaMetadata,
        output: &MediaMetadata,
        report: &mut ValidationReport,
    ) {
        let (Some(source_res), Some(output_res)) = (source.resolution, output.resolution) else {
            return;
        };
        if source_res.pixels() == 0 {
            return;
        }
        let retained = output_res.pixels() as f64 / source_res.pixels() as f64;
        let loss = 1.0 - retained;
        if loss > RESOLUTION_LOSS_RATIO {
            report.issues.push(format!(
                "Resolution reduced by {:.1}% ({} -> {})",
                loss * 100.0,
                source_res,
                output_res
            ));
        }
    }

    fn check_size(
        &self,
        source: &MediaMetadata,
        output: &MediaMetadata,
        report: &mut ValidationReport,
    ) {
        if output.size_bytes == 0 {
            report.passed = false;
            report.issues.push("Output file has zero size".to_string());
            return;
        }
        if source.size_bytes > 0 {
            let ratio = output.size_bytes as f64 / source.size_bytes as f64;
            if ratio < SUSPICIOUS_SIZE_RATIO {
                report.issues.push(format!(
                    "Output file is suspiciously small ({} bytes, {:.1}% of source)",
                    output.size_bytes,
                    ratio * 100.0
                ));
            }
        }
    }

    fn check_duration(
        &self,
        source: &MediaMetadata,
        output: &MediaMetadata,
        report: &mut ValidationReport,
    ) {
        if source.duration_secs <= 0.0 {
            return;
        }
        let drift = (output.duration_secs - source.duration_secs).abs();
        if drift > self.duration_tolerance_secs {
            let drift_pct = drift / source.duration_secs * 100.0;
            report.passed = false;
            report.issues.push(format!(
                "Duration changed by {:.1}% ({:.2}s -> {:.2}s)",
                drift_pct, source.duration_secs, output.duration_secs
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Resolution;
    use crate::domain::rules::PresetResolver;

    fn metadata(format: &str, duration: f64, size: u64) -> MediaMetadata {
        MediaMetadata {
            format_name: format.to_string(),
            duration_secs: duration,
            size_bytes: size,
            bit_rate: None,
            video_codec: Some("h264".to_string()),
            audio_codec: Some("aac".to_string()),
            resolution: Some(Resolution {
                width: 1920,
                height: 1080,
            }),
        }
    }

    fn validator() -> OutputValidator {
        OutputValidator::new(1.0)
    }

    #[test]
    fn test_clean_conversion_passes() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 4_000_000);

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_format_mismatch_fails() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let output = metadata("matroska,webm", 10.0, 4_000_000);

        let report = validator().validate(&source, &output, &params);
        assert!(!report.passed);
        assert!(report.issues[0].contains("Expected format mp4"));
    }

    #[test]
    fn test_mkv_accepts_matroska_format_name() {
        let params = PresetResolver::resolve("archive", Some("mkv"), Some("h265")).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let mut output = metadata("matroska,webm", 10.0, 8_000_000);
        output.video_codec = Some("hevc".to_string());
        output.audio_codec = Some("pcm_s24le".to_string());

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed, "issues: {:?}", report.issues);
    }

    #[test]
    fn test_h265_accepts_hevc_codec_name() {
        let params = PresetResolver::resolve("web", Some("mp4"), Some("h265")).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let mut output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 4_000_000);
        output.video_codec = Some("hevc".to_string());

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed);
    }

    #[test]
    fn test_wrong_video_codec_fails() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let mut output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 4_000_000);
        output.video_codec = Some("mpeg4".to_string());

        let report = validator().validate(&source, &output, &params);
        assert!(!report.passed);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.contains("video codec")));
    }

    #[test]
    fn test_aac_lc_is_equivalent_to_aac() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let mut output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 4_000_000);
        output.audio_codec = Some("aac_lc".to_string());

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed);
    }

    #[test]
    fn test_zero_byte_output_fails() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 0);

        let report = validator().validate(&source, &output, &params);
        assert!(!report.passed);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.contains("zero size")));
    }

    #[test]
    fn test_duration_drift_beyond_tolerance_fails() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 7.5, 4_000_000);

        let report = validator().validate(&source, &output, &params);
        assert!(!report.passed);
        assert!(report.issues.iter().any(|issue| issue.contains("Duration")));
    }

    #[test]
    fn test_small_duration_drift_within_tolerance_passes() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.4, 4_000_000);

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed);
    }

    #[test]
    fn test_resolution_loss_is_advisory() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 10_000_000);
        let mut output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 4_000_000);
        output.resolution = Some(Resolution {
            width: 1280,
            height: 720,
        });

        let report = validator().validate(&source, &output, &params);
        // downscaling is surfaced but does not fail validation on its own
        assert!(report.passed);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.contains("Resolution reduced")));
    }

    #[test]
    fn test_suspiciously_small_output_is_advisory() {
        let params = PresetResolver::resolve("web", None, None).unwrap();
        let source = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 100_000_000);
        let output = metadata("mov,mp4,m4a,3gp,3g2,mj2", 10.0, 500_000);

        let report = validator().validate(&source, &output, &params);
        assert!(report.passed);
        assert!(report
            .issues
            .iter()
            .any(|issue| issue.contains("suspiciously small")));
    }
}
