// Job orchestrator - Owns the job lifecycle state machine

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::advisor::AdvisorAdapter;
use crate::config::NormalizerConfig;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::*;
use crate::domain::rules::PresetResolver;
use crate::output::OutputValidator;
use crate::ports::*;

/// Idle delay between pending-queue polls in the worker loop
const WORKER_IDLE_POLL: Duration = Duration::from_millis(500);

/// Sequences a job through resolve -> advise -> encode -> validate and owns
/// every status transition. All coordination between workers goes through
/// the job store's atomic claim; the orchestrator keeps no job state of its
/// own.
pub struct JobOrchestrator {
    config: NormalizerConfig,
    job_store: Arc<dyn JobStore>,
    artifact_store: Arc<dyn ArtifactStore>,
    engine: Arc<dyn EncodeEngine>,
    prober: Arc<dyn MediaProber>,
    advisor: AdvisorAdapter,
    validator: OutputValidator,
}

impl JobOrchestrator {
    pub fn new(
        config: NormalizerConfig,
        job_store: Arc<dyn JobStore>,
        artifact_store: Arc<dyn ArtifactStore>,
        engine: Arc<dyn EncodeEngine>,
        prober: Arc<dyn MediaProber>,
        advisor: Arc<dyn ParameterAdvisor>,
    ) -> Self {
        let advisor = AdvisorAdapter::new(
            advisor,
            Duration::from_secs(config.advisor_timeout_secs),
        );
        let validator = OutputValidator::new(config.duration_tolerance_secs);
        Self {
            config,
            job_store,
            artifact_store,
            engine,
            prober,
            advisor,
            validator,
        }
    }

    /// Accept a conversion request. Structural validation and preset
    /// resolution run synchronously; a request that cannot possibly convert
    /// is rejected here and no job record is created.
    pub async fn submit(&self, request: ConversionRequest) -> PipelineResult<Job> {
        request.validate()?;
        PresetResolver::resolve(
            &request.preset,
            Some(&request.format),
            request.codec.as_deref(),
        )?;

        let job = Job::new(request);
        let record = job.clone();
        self.with_retries("insert_job", &job.id, || {
            let store = Arc::clone(&self.job_store);
            let record = record.clone();
            async move { store.insert(record).await }
        })
        .await?;

        info!(
            job_id = %job.id,
            source = job.request.source.describe(),
            format = %job.request.format,
            preset = %job.request.preset,
            "Job submitted"
        );
        Ok(job)
    }

    /// Full job record for a status query
    pub async fn status(&self, id: &str) -> PipelineResult<Job> {
        self.job_store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::JobNotFound { id: id.to_string() })
    }

    /// Job records matching an optional status filter, most recent first
    pub async fn list(
        &self,
        filter: Option<JobStatus>,
        limit: usize,
    ) -> PipelineResult<Vec<Job>> {
        self.job_store.list(filter, limit).await
    }

    /// Claim a job and run it to a terminal state. A lost claim returns the
    /// job's current record without running the pipeline. Pipeline errors
    /// are recorded on the job, never propagated past the job boundary.
    pub async fn process_job(&self, id: &str) -> PipelineResult<Job> {
        let Some(mut job) = self.job_store.claim(id).await? else {
            debug!(job_id = id, "Claim lost, job already taken");
            return self.status(id).await;
        };
        info!(job_id = %job.id, "Job claimed");

        let started = Instant::now();
        let work_dir = self.config.work_dir.join(&job.id);
        match self.run_pipeline(&job, &work_dir, started).await {
            Ok((result, validation)) => {
                info!(
                    job_id = %job.id,
                    artifact = %result.artifact,
                    processing_secs = result.processing_time_secs,
                    "Job completed"
                );
                job.complete(result, validation)?;
            }
            Err(e) => {
                error!(job_id = %job.id, code = e.code(), error = %e, "Job failed");
                job.fail(JobFailure::from_error(&e))?;
            }
        }

        // scratch cleanup runs for every terminal outcome
        self.cleanup_work_dir(&work_dir).await;
        self.persist_job(&job).await?;
        Ok(job)
    }

    /// Worker loop: claim and process pending jobs until shut down. Each
    /// job runs inside this task; independent workers run on their own
    /// tasks so one slow encode never starves the rest.
    pub async fn run_worker(self: Arc<Self>) {
        loop {
            match self.job_store.next_pending().await {
                Ok(Some(id)) => {
                    if let Err(e) = self.process_job(&id).await {
                        error!(job_id = %id, error = %e, "Worker could not finalize job");
                    }
                }
                Ok(None) => tokio::time::sleep(WORKER_IDLE_POLL).await,
                Err(e) => {
                    warn!(error = %e, "Worker failed to poll pending jobs");
                    tokio::time::sleep(WORKER_IDLE_POLL).await;
                }
            }
        }
    }

    /// Spawn the configured number of worker tasks, each running the claim
    /// loop. Returns the task handles so the host can shut the pool down.
    pub fn run_workers(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let count = self.config.workers.max(1);
        info!(workers = count, "Starting worker pool");
        (0..count)
            .map(|_| {
                let worker = Arc::clone(&self);
                tokio::spawn(worker.run_worker())
            })
            .collect()
    }

    /// Process pending jobs until the queue is empty, returning how many
    /// jobs reached a terminal state
    pub async fn drain_pending(&self) -> PipelineResult<usize> {
        let mut processed = 0;
        while let Some(id) = self.job_store.next_pending().await? {
            self.process_job(&id).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// The sequential pipeline for one claimed job
    async fn run_pipeline(
        &self,
        job: &Job,
        work_dir: &Path,
        started: Instant,
    ) -> PipelineResult<(ConversionResult, Option<ValidationReport>)> {
        let request = &job.request;
        tokio::fs::create_dir_all(work_dir).await?;

        // Stage 1: retrieve the source (transient failures retried)
        let input = self
            .with_retries("fetch_source", &job.id, || {
                let store = Arc::clone(&self.artifact_store);
                let source = request.source.clone();
                let work_dir = work_dir.to_path_buf();
                async move { store.fetch(&source, &work_dir).await }
            })
            .await?;

        // Stage 2: probe the source
        let source_metadata = self.prober.probe(&input).await?;
        debug!(
            job_id = %job.id,
            duration_secs = source_metadata.duration_secs,
            format = %source_metadata.format_name,
            "Source probed"
        );

        // Stage 3: resolve the preset into baseline parameters
        let baseline = PresetResolver::resolve(
            &request.preset,
            Some(&request.format),
            request.codec.as_deref(),
        )?;

        // Stage 4: optional content-aware overrides, degrade-soft
        let params = if request.enable_ai {
            let descriptor = ContentDescriptor::from_metadata(&source_metadata);
            let overrides = self
                .advisor
                .advise_or_baseline(&job.id, &descriptor, &baseline)
                .await;
            baseline.merged_with(&overrides)
        } else {
            baseline
        };

        // Stage 5: encode
        let output = work_dir.join(Self::output_file_name(&request.source, &params.container));
        self.engine
            .execute(
                &input,
                &output,
                &params,
                &source_metadata,
                Duration::from_secs(self.config.encode_timeout_secs),
            )
            .await?;

        // Stage 6: probe the produced artifact
        let output_metadata = self.prober.probe(&output).await?;

        // Stage 7: optional validation; advisory unless configured blocking
        let validation = if request.validate_output {
            let report = self
                .validator
                .validate(&source_metadata, &output_metadata, &params);
            if !report.passed && self.config.validation_blocking {
                self.discard_rejected(&output).await;
                return Err(PipelineError::ValidationFailed {
                    issues: report.issues,
                });
            }
            Some(report)
        } else {
            None
        };

        // Stage 8: persist the artifact (transient failures retried)
        let key = format!(
            "{}/{}",
            job.id,
            output
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("output")
        );
        let artifact = self
            .with_retries("persist_artifact", &job.id, || {
                let store = Arc::clone(&self.artifact_store);
                let output = output.clone();
                let key = key.clone();
                async move { store.persist(&output, &key).await }
            })
            .await?;

        let result = ConversionResult {
            artifact,
            format: params.container.clone(),
            codec: params.video_codec.clone(),
            size_bytes: output_metadata.size_bytes,
            duration_secs: output_metadata.duration_secs,
            resolution: output_metadata.resolution,
            compression_ratio: if output_metadata.size_bytes > 0 {
                source_metadata.size_bytes as f64 / output_metadata.size_bytes as f64
            } else {
                0.0
            },
            processing_time_secs: started.elapsed().as_secs_f64(),
        };

        Ok((result, validation))
    }

    /// Persist a job record with retries on transient store failures
    async fn persist_job(&self, job: &Job) -> PipelineResult<()> {
        self.with_retries("update_job", &job.id, || {
            let store = Arc::clone(&self.job_store);
            let job = job.clone();
            async move { store.update(&job).await }
        })
        .await
    }

    /// Bounded exponential backoff around a transient operation. Retries
    /// are invisible to the external status contract.
    async fn with_retries<T, F, Fut>(
        &self,
        operation: &str,
        job_id: &str,
        mut attempt_fn: F,
    ) -> PipelineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PipelineResult<T>>,
    {
        let attempts = self.config.retry_attempts.max(1);
        let mut delay = Duration::from_millis(self.config.retry_base_delay_ms);
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        job_id,
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn output_file_name(source: &SourceRef, container: &str) -> String {
        let name = source.file_name();
        let stem = Path::new(&name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("output");
        format!("normalized_{}.{}", stem, container)
    }

    /// Discard an artifact that validation rejected; nothing downstream may
    /// ever see it. Best-effort.
    async fn discard_rejected(&self, output: &Path) {
        if let Err(e) = self.artifact_store.discard(output).await {
            warn!(path = %output.display(), error = %e, "Failed to discard rejected output");
        }
    }

    /// Best-effort scratch cleanup; failures are logged, never fatal
    async fn cleanup_work_dir(&self, work_dir: &Path) {
        if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %work_dir.display(), error = %e, "Failed to remove work directory");
            }
        }
    }
}
