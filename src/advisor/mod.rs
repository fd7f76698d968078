//! Parameter advisor - optional content-aware override capability
//!
//! The advisor is strictly best-effort: a timeout, transport failure, or
//! malformed response degrades to "no overrides" and the job continues with
//! baseline parameters. Degradation is logged, never surfaced as a failure.

mod http;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::errors::AdvisorError;
use crate::domain::model::{ContentDescriptor, ParameterOverrides, ParameterSet};
use crate::ports::ParameterAdvisor;

pub use http::HttpAdvisor;

/// Wraps any advisor implementation with a time budget and folds every
/// failure into the explicit degraded branch.
pub struct AdvisorAdapter {
    inner: Arc<dyn ParameterAdvisor>,
    budget: Duration,
}

impl AdvisorAdapter {
    pub fn new(inner: Arc<dyn ParameterAdvisor>, budget: Duration) -> Self {
        Self { inner, budget }
    }

    /// Ask the advisor for overrides. Returns empty overrides on any
    /// degradation; the caller merges the result over its baseline either way.
    pub async fn advise_or_baseline(
        &self,
        job_id: &str,
        descriptor: &ContentDescriptor,
        baseline: &ParameterSet,
    ) -> ParameterOverrides {
        let outcome = tokio::time::timeout(self.budget, self.inner.advise(descriptor, baseline))
            .await
            .unwrap_or(Err(AdvisorError::Timeout {
                seconds: self.budget.as_secs(),
            }));

        match outcome {
            Ok(overrides) => {
                debug!(
                    job_id,
                    override_count = overrides.video.len() + overrides.audio.len(),
                    "Advisor returned overrides"
                );
                overrides
            }
            Err(AdvisorError::Unconfigured) => {
                debug!(job_id, "No advisor configured, using baseline parameters");
                ParameterOverrides::default()
            }
            Err(e) => {
                warn!(
                    job_id,
                    reason = %e,
                    "Advisor degraded, continuing with baseline parameters"
                );
                ParameterOverrides::default()
            }
        }
    }
}

/// Advisor used when no endpoint is configured
pub struct NoopAdvisor;

#[async_trait::async_trait]
impl ParameterAdvisor for NoopAdvisor {
    async fn advise(
        &self,
        _descriptor: &ContentDescriptor,
        _baseline: &ParameterSet,
    ) -> Result<ParameterOverrides, AdvisorError> {
        Err(AdvisorError::Unconfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::PresetResolver;

    struct SlowAdvisor;

    #[async_trait::async_trait]
    impl ParameterAdvisor for SlowAdvisor {
        async fn advise(
            &self,
            _descriptor: &ContentDescriptor,
            _baseline: &ParameterSet,
        ) -> Result<ParameterOverrides, AdvisorError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ParameterOverrides::default())
        }
    }

    struct FixedAdvisor;

    #[async_trait::async_trait]
    impl ParameterAdvisor for FixedAdvisor {
        async fn advise(
            &self,
            _descriptor: &ContentDescriptor,
            _baseline: &ParameterSet,
        ) -> Result<ParameterOverrides, AdvisorError> {
            let mut overrides = ParameterOverrides::default();
            overrides.video.insert("crf".to_string(), "19".to_string());
            Ok(overrides)
        }
    }

    fn descriptor() -> ContentDescriptor {
        ContentDescriptor {
            duration_secs: 10.0,
            size_bytes: 1_000_000,
            bit_rate: Some(800_000),
            resolution: None,
            format_name: "mov".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_to_empty_overrides() {
        let adapter = AdvisorAdapter::new(Arc::new(SlowAdvisor), Duration::from_secs(1));
        let baseline = PresetResolver::resolve("web", None, None).unwrap();
        let overrides = adapter
            .advise_or_baseline("job-1", &descriptor(), &baseline)
            .await;
        assert!(overrides.is_empty());
    }

    #[tokio::test]
    async fn test_successful_advice_passes_through() {
        let adapter = AdvisorAdapter::new(Arc::new(FixedAdvisor), Duration::from_secs(5));
        let baseline = PresetResolver::resolve("web", None, None).unwrap();
        let overrides = adapter
            .advise_or_baseline("job-1", &descriptor(), &baseline)
            .await;
        assert_eq!(overrides.video.get("crf").unwrap(), "19");
    }

    #[tokio::test]
    async fn test_unconfigured_advisor_degrades_silently() {
        let adapter = AdvisorAdapter::new(Arc::new(NoopAdvisor), Duration::from_secs(5));
        let baseline = PresetResolver::resolve("web", None, None).unwrap();
        let overrides = adapter
            .advise_or_baseline("job-1", &descriptor(), &baseline)
            .await;
        assert!(overrides.is_empty());
    }
}
