// Domain errors - Pipeline error taxonomy

use thiserror::Error;

/// Errors raised by the normalization pipeline and its collaborators
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Unknown preset name
    #[error("Unknown preset: {name}")]
    InvalidPreset { name: String },

    /// Requested codec cannot be muxed into the requested container
    #[error("Codec {codec} is not compatible with container {container}")]
    IncompatibleCodec { codec: String, container: String },

    /// Source artifact could not be retrieved
    #[error("Source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// Codec engine exited with a non-zero status
    #[error("Encode failed (exit code {exit_code:?}): {message}")]
    EncodeFailure {
        exit_code: Option<i32>,
        message: String,
    },

    /// Codec engine exceeded its wall-clock budget
    #[error("Encode timed out after {seconds}s")]
    EncodeTimeout { seconds: u64 },

    /// Job record or artifact store unavailable
    #[error("Persistence failure: {message}")]
    PersistenceFailure { message: String },

    /// Output validation failed while blocking validation is enabled
    #[error("Output validation failed: {issues:?}")]
    ValidationFailed { issues: Vec<String> },

    /// Request rejected at submission, before any job record exists
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// Unknown job id
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// Attempted transition out of a terminal job state
    #[error("Invalid job transition: {message}")]
    InvalidTransition { message: String },

    /// Media probe failed
    #[error("Probe failed: {message}")]
    ProbeFailure { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable machine-usable code recorded on failed job records
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidPreset { .. } => "InvalidPreset",
            PipelineError::IncompatibleCodec { .. } => "IncompatibleCodec",
            PipelineError::SourceUnavailable { .. } => "SourceUnavailable",
            PipelineError::EncodeFailure { .. } => "EncodeFailure",
            PipelineError::EncodeTimeout { .. } => "EncodeTimeout",
            PipelineError::PersistenceFailure { .. } => "PersistenceFailure",
            PipelineError::ValidationFailed { .. } => "ValidationFailed",
            PipelineError::MalformedRequest { .. } => "MalformedRequest",
            PipelineError::JobNotFound { .. } => "NotFound",
            PipelineError::InvalidTransition { .. } => "InvalidTransition",
            PipelineError::ProbeFailure { .. } => "ProbeFailure",
            PipelineError::Config { .. } => "Config",
            PipelineError::Io(_) => "Io",
        }
    }

    /// Whether the retry loop may attempt this operation again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. }
                | PipelineError::PersistenceFailure { .. }
                | PipelineError::Io(_)
        )
    }
}

/// Advisor failures are a separate taxonomy: they degrade to baseline
/// parameters and never become a job failure
#[derive(Error, Debug)]
pub enum AdvisorError {
    /// Advisor call exceeded its time budget
    #[error("Advisor timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Network or HTTP failure
    #[error("Advisor transport error: {message}")]
    Transport { message: String },

    /// Response could not be parsed into overrides
    #[error("Malformed advisor response: {message}")]
    MalformedResponse { message: String },

    /// No advisor endpoint configured
    #[error("Advisor not configured")]
    Unconfigured,
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
