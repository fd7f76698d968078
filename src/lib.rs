//! FormatNorm - Media Format Normalization Library
//!
//! A job-oriented media normalization pipeline: submitted conversion
//! requests become durable job records that stateless workers claim and
//! drive through preset resolution, optional AI-assisted parameter tuning,
//! external codec execution, and output validation.

pub mod advisor;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod output;
pub mod ports;
pub mod probe;
pub mod store;

// Re-export commonly used types
pub use app::JobOrchestrator;
pub use config::NormalizerConfig;
pub use domain::errors::{AdvisorError, PipelineError, PipelineResult};
pub use domain::model::{
    ContentDescriptor, ConversionRequest, ConversionResult, Job, JobFailure, JobStatus,
    MediaMetadata, ParameterOverrides, ParameterSet, Priority, Resolution, SourceRef,
    ValidationReport,
};
pub use domain::rules::PresetResolver;
