//! Command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::advisor::{HttpAdvisor, NoopAdvisor};
use crate::app::JobOrchestrator;
use crate::cli::args::{ConvertArgs, InspectArgs, PresetsArgs};
use crate::config::NormalizerConfig;
use crate::domain::model::{ConversionRequest, JobStatus, Priority, SourceRef};
use crate::domain::rules::PresetResolver;
use crate::engine::FfmpegEngine;
use crate::ports::{MediaProber, ParameterAdvisor};
use crate::probe::FfprobeProber;
use crate::store::{FsArtifactStore, MemoryJobStore};

/// Wire an orchestrator against the local reference adapters
fn build_orchestrator(config: NormalizerConfig) -> JobOrchestrator {
    let advisor: Arc<dyn ParameterAdvisor> = match &config.advisor_endpoint {
        Some(endpoint) => Arc::new(HttpAdvisor::new(endpoint.clone())),
        None => Arc::new(NoopAdvisor),
    };
    JobOrchestrator::new(
        config.clone(),
        Arc::new(MemoryJobStore::new()),
        Arc::new(FsArtifactStore::new(config.artifact_root.clone())),
        Arc::new(FfmpegEngine::new(config.ffmpeg_bin.clone())),
        Arc::new(FfprobeProber::new(config.ffprobe_bin.clone())),
        advisor,
    )
}

/// Execute the convert command: submit one request and run it to a
/// terminal state in-process
pub async fn convert(args: ConvertArgs, config: NormalizerConfig) -> Result<()> {
    let source = if args.input.starts_with("http://") || args.input.starts_with("https://") {
        SourceRef::Url(args.input.clone())
    } else {
        SourceRef::Upload(args.input.clone())
    };

    let request = ConversionRequest {
        source,
        format: args.format,
        codec: args.codec,
        preset: args.preset,
        enable_ai: args.ai,
        validate_output: !args.no_validate,
        priority: Priority::parse(&args.priority)?,
    };

    let orchestrator = build_orchestrator(config);
    let job = orchestrator
        .submit(request)
        .await
        .context("Submission rejected")?;
    info!(job_id = %job.id, "Submitted, processing");

    let job = orchestrator
        .process_job(&job.id)
        .await
        .context("Failed to finalize job")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
        return finish(job.status);
    }

    println!("Job:       {}", job.id);
    println!("Status:    {}", job.status);
    if let Some(result) = &job.result {
        println!("Artifact:  {}", result.artifact);
        println!("Format:    {} ({})", result.format, result.codec);
        println!("Duration:  {:.2}s", result.duration_secs);
        println!("Size:      {} bytes", result.size_bytes);
        if let Some(resolution) = result.resolution {
            println!("Video:     {}", resolution);
        }
        println!("Ratio:     {:.2}x", result.compression_ratio);
        println!("Took:      {:.2}s", result.processing_time_secs);
    }
    if let Some(validation) = &job.validation {
        println!(
            "Validation: {}",
            if validation.passed { "passed" } else { "FAILED" }
        );
        for issue in &validation.issues {
            println!("  - {}", issue);
        }
    }
    if let Some(error) = &job.error {
        println!("Error:     [{}] {}", error.code, error.message);
    }
    finish(job.status)
}

fn finish(status: JobStatus) -> Result<()> {
    if status == JobStatus::Failed {
        anyhow::bail!("Conversion failed");
    }
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config: NormalizerConfig) -> Result<()> {
    let prober = FfprobeProber::new(config.ffprobe_bin);
    let metadata = prober
        .probe(std::path::Path::new(&args.input))
        .await
        .context("Failed to probe input file")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("Format:    {}", metadata.format_name);
    println!("Duration:  {:.2}s", metadata.duration_secs);
    println!("Size:      {} bytes", metadata.size_bytes);
    if let Some(bit_rate) = metadata.bit_rate {
        println!("Bitrate:   {} b/s", bit_rate);
    }
    if let Some(codec) = &metadata.video_codec {
        println!("Video:     {}", codec);
    }
    if let Some(resolution) = metadata.resolution {
        println!("Picture:   {}", resolution);
    }
    if let Some(codec) = &metadata.audio_codec {
        println!("Audio:     {}", codec);
    }
    Ok(())
}

/// Execute the presets command
pub fn presets(args: PresetsArgs) -> Result<()> {
    if args.json {
        let entries: Vec<serde_json::Value> = PresetResolver::presets()
            .iter()
            .map(|preset| {
                serde_json::json!({
                    "name": preset.name,
                    "description": preset.description,
                    "default_format": preset.default_format,
                    "allowed_formats": preset.allowed_formats,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for preset in PresetResolver::presets() {
        println!(
            "{:<10} {} (formats: {})",
            preset.name,
            preset.description,
            preset.allowed_formats.join(", ")
        );
    }
    Ok(())
}
