// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::PipelineError;


/// Lifecycle state of a normalization job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Parse a status filter string (e.g. from the listing interface)
    pub fn parse(status_str: &str) -> Result<Self, PipelineError> {
        match status_str.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(PipelineError::MalformedRequest {
                message: format!(
                    "Invalid status: {}. Valid values: pending, processing, completed, failed",
                    status_str
                ),
            }),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Reference to the source media of a conversion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum SourceRef {
    /// Handle of a previously uploaded artifact
    Upload(String),
    /// Remote URL to fetch the source from
    Url(String),
}

impl SourceRef {
    /// Human-readable reference for logs and error messages
    pub fn describe(&self) -> &str {
        match self {
            SourceRef::Upload(handle) => handle,
            SourceRef::Url(url) => url,
        }
    }

    /// File name component of the reference, used to derive output names.
    /// URL query strings and fragments are not part of the name.
    pub fn file_name(&self) -> String {
        let reference = self.describe();
        let path = reference.split(['?', '#']).next().unwrap_or(reference);
        path.rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("source")
            .to_string()
    }
}

/// Scheduling hint for pending jobs; advisory only
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Parse a priority hint string
    pub fn parse(priority_str: &str) -> Result<Self, PipelineError> {
        match priority_str.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(PipelineError::MalformedRequest {
                message: format!(
                    "Invalid priority: {}. Valid values: low, normal, high",
                    priority_str
                ),
            }),
        }
    }
}

/// Immutable snapshot of a submitted conversion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Source media reference
    pub source: SourceRef,
    /// Target container format (e.g. "mp4")
    pub format: String,
    /// Target video codec; defaulted by the preset when absent
    pub codec: Option<String>,
    /// Quality preset name
    pub preset: String,
    /// Whether to ask the parameter advisor for content-aware overrides
    pub enable_ai: bool,
    /// Whether to validate the produced artifact
    pub validate_output: bool,
    /// Scheduling hint among pending jobs
    pub priority: Priority,
}

impl ConversionRequest {
    /// Create a request with the default preset and flags
    pub fn new(source: SourceRef, format: impl Into<String>) -> Self {
        Self {
            source,
            format: format.into(),
            codec: None,
            preset: "standard".to_string(),
            enable_ai: false,
            validate_output: true,
            priority: Priority::Normal,
        }
    }

    /// Structural validation performed synchronously at submission
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.source.describe().trim().is_empty() {
            return Err(PipelineError::MalformedRequest {
                message: "Source reference is empty".to_string(),
            });
        }
        if self.format.trim().is_empty() {
            return Err(PipelineError::MalformedRequest {
                message: "Target format is empty".to_string(),
            });
        }
        if self.preset.trim().is_empty() {
            return Err(PipelineError::MalformedRequest {
                message: "Preset name is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Output dimensions of a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Total pixel count, used for resolution-preservation checks
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Result block of a completed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Reference to the produced artifact in the artifact store
    pub artifact: String,
    /// Final container format
    pub format: String,
    /// Final video codec (or audio codec for audio-only output)
    pub codec: String,
    /// Output size in bytes
    pub size_bytes: u64,
    /// Output duration in seconds
    pub duration_secs: f64,
    /// Output resolution, when the artifact has video
    pub resolution: Option<Resolution>,
    /// Source size divided by output size; 0.0 when unknown
    pub compression_ratio: f64,
    /// Wall-clock pipeline time in seconds
    pub processing_time_secs: f64,
}

/// Verdict of output validation with itemized issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// A passing report with no issues
    pub fn passing() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
        }
    }
}

/// Terminal error recorded on a failed job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    /// Stable machine-usable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl JobFailure {
    /// Capture the code and message of a pipeline error
    pub fn from_error(error: &PipelineError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// A normalization job and its lifecycle record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Opaque unique identifier, generated at submission
    pub id: String,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Immutable snapshot of the submitted parameters
    pub request: ConversionRequest,
    /// Present only when the job completed
    pub result: Option<ConversionResult>,
    /// Present when validation ran
    pub validation: Option<ValidationReport>,
    /// Present only when the job failed
    pub error: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly once, on entering a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new pending job for a validated request
    pub fn new(request: ConversionRequest) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            request,
            result: None,
            validation: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Transition `pending -> processing`
    pub fn begin_processing(&mut self) -> Result<(), PipelineError> {
        if self.status != JobStatus::Pending {
            return Err(PipelineError::InvalidTransition {
                message: format!("Job {} is {}, expected pending", self.id, self.status),
            });
        }
        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition `processing -> completed`, attaching the result and any
    /// validation report
    pub fn complete(
        &mut self,
        result: ConversionResult,
        validation: Option<ValidationReport>,
    ) -> Result<(), PipelineError> {
        self.ensure_processing("complete")?;
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.validation = validation;
        self.finalize();
        Ok(())
    }

    /// Transition `processing -> failed`, attaching the terminal error
    pub fn fail(&mut self, failure: JobFailure) -> Result<(), PipelineError> {
        self.ensure_processing("fail")?;
        self.status = JobStatus::Failed;
        self.error = Some(failure);
        self.finalize();
        Ok(())
    }

    /// Attach a validation report without changing state
    pub fn record_validation(&mut self, report: ValidationReport) {
        self.validation = Some(report);
        self.updated_at = Utc::now();
    }

    fn ensure_processing(&self, action: &str) -> Result<(), PipelineError> {
        if self.status != JobStatus::Processing {
            return Err(PipelineError::InvalidTransition {
                message: format!(
                    "Cannot {} job {}: status is {}, expected processing",
                    action, self.id, self.status
                ),
            });
        }
        Ok(())
    }

    fn finalize(&mut self) {
        let now = Utc::now();
        self.updated_at = now;
        // completed_at is write-once
        if self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
    }
}

/// Fully-resolved encode parameter set produced by the preset resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Target container format
    pub container: String,
    /// Target video codec
    pub video_codec: String,
    /// Video encoder options (crf, preset, maxrate, ...)
    pub video: BTreeMap<String, String>,
    /// Audio encoder options (codec, bitrate, sample_rate, ...)
    pub audio: BTreeMap<String, String>,
    /// Extra engine arguments appended verbatim
    pub extra_args: Vec<String>,
}

impl ParameterSet {
    /// Apply advisor overrides on top of this baseline. Advisor values win
    /// per key; container and codec are never overridden.
    pub fn merged_with(&self, overrides: &ParameterOverrides) -> Self {
        let mut merged = self.clone();
        for (key, value) in &overrides.video {
            merged.video.insert(key.clone(), value.clone());
        }
        for (key, value) in &overrides.audio {
            merged.audio.insert(key.clone(), value.clone());
        }
        merged
            .extra_args
            .extend(overrides.extra_args.iter().cloned());
        merged
    }
}

/// Possibly-empty parameter overrides returned by the advisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterOverrides {
    #[serde(default)]
    pub video: BTreeMap<String, String>,
    #[serde(default)]
    pub audio: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ParameterOverrides {
    /// Whether the advisor suggested anything at all
    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty() && self.extra_args.is_empty()
    }
}

/// Technical metadata probed from a media artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Container format name as reported by the prober (comma-separated list)
    pub format_name: String,
    /// Duration in seconds
    pub duration_secs: f64,
    /// File size in bytes
    pub size_bytes: u64,
    /// Overall bit rate in bits per second, when reported
    pub bit_rate: Option<u64>,
    /// Primary video codec, when the artifact has video
    pub video_codec: Option<String>,
    /// Primary audio codec, when the artifact has audio
    pub audio_codec: Option<String>,
    /// Primary video resolution
    pub resolution: Option<Resolution>,
}

impl MediaMetadata {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    /// Whether the probed container matches the expected format. Probers
    /// report format names as comma-separated lists (e.g.
    /// "mov,mp4,m4a,3gp,3g2,mj2"), so this is a membership check.
    pub fn matches_format(&self, expected: &str) -> bool {
        let expected = expected.to_lowercase();
        self.format_name
            .to_lowercase()
            .split(',')
            .any(|name| name.trim() == expected)
    }
}

/// Cheap content descriptor handed to the parameter advisor. Derived from a
/// probe, never a full decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub bit_rate: Option<u64>,
    pub resolution: Option<Resolution>,
    pub format_name: String,
}

impl ContentDescriptor {
    /// Derive a descriptor from probed metadata
    pub fn from_metadata(metadata: &MediaMetadata) -> Self {
        Self {
            duration_secs: metadata.duration_secs,
            size_bytes: metadata.size_bytes,
            bit_rate: metadata.bit_rate,
            resolution: metadata.resolution,
            format_name: metadata.format_name.clone(),
        }
    }
}

/// Named bundle of default encode parameters
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    /// Allowed output container formats for this preset
    pub allowed_formats: &'static [&'static str],
    /// Default container when the request does not specify one
    pub default_format: &'static str,
}
