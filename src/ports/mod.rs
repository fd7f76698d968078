// Ports - Capability interfaces the orchestrator is wired against

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::{AdvisorError, PipelineResult};
use crate::domain::model::*;

/// Durable key-value persistence of job records. The store is the single
/// source of truth for job status; the claim operation is the coordination
/// primitive between stateless workers.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a newly created job record
    async fn insert(&self, job: Job) -> PipelineResult<()>;

    /// Fetch a job record by id
    async fn get(&self, id: &str) -> PipelineResult<Option<Job>>;

    /// Persist an updated job record
    async fn update(&self, job: &Job) -> PipelineResult<()>;

    /// Atomically transition a job from `pending` to `processing`.
    /// Exactly one concurrent caller observes the claimed job; all others
    /// get `None`. Implementations must provide compare-and-set semantics.
    async fn claim(&self, id: &str) -> PipelineResult<Option<Job>>;

    /// Next pending job id, highest priority first, then submission order
    async fn next_pending(&self) -> PipelineResult<Option<String>>;

    /// Job records matching an optional status filter, most recent first
    async fn list(&self, filter: Option<JobStatus>, limit: usize) -> PipelineResult<Vec<Job>>;
}

/// Blob read/write for source and result media
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Materialize the source artifact as a local file under `dest_dir`
    async fn fetch(&self, source: &SourceRef, dest_dir: &Path) -> PipelineResult<PathBuf>;

    /// Persist a produced artifact under `key`, returning its reference
    async fn persist(&self, local: &Path, key: &str) -> PipelineResult<String>;

    /// Discard a partial or temporary artifact; missing files are not an error
    async fn discard(&self, path: &Path) -> PipelineResult<()>;
}

/// Opaque external codec engine. The pipeline depends only on exit status
/// and the produced file; it never inspects the engine's internals.
#[async_trait]
pub trait EncodeEngine: Send + Sync {
    /// Encode `input` to `output` with the final parameter set, within the
    /// wall-clock `timeout`. A failed or timed-out execution must leave no
    /// partial output behind.
    async fn execute(
        &self,
        input: &Path,
        output: &Path,
        params: &ParameterSet,
        source: &MediaMetadata,
        timeout: Duration,
    ) -> PipelineResult<()>;
}

/// Cheap technical-metadata probe; never a full decode
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> PipelineResult<MediaMetadata>;
}

/// External content-aware parameter recommendation capability. Failures are
/// their own taxonomy so the caller can fold them into "use baseline".
#[async_trait]
pub trait ParameterAdvisor: Send + Sync {
    async fn advise(
        &self,
        descriptor: &ContentDescriptor,
        baseline: &ParameterSet,
    ) -> Result<ParameterOverrides, AdvisorError>;
}
