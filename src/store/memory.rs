//! In-memory job store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::model::{Job, JobStatus};
use crate::ports::JobStore;

/// In-memory `JobStore` for single-process deployments and tests. The claim
/// compare-and-set runs under the write lock, so concurrent claims on one id
/// resolve to exactly one winner.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: Job) -> PipelineResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(PipelineError::PersistenceFailure {
                message: format!("Duplicate job id: {}", job.id),
            });
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get(&self, id: &str) -> PipelineResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn update(&self, job: &Job) -> PipelineResult<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(PipelineError::PersistenceFailure {
                message: format!("Cannot update unknown job: {}", job.id),
            }),
        }
    }

    async fn claim(&self, id: &str) -> PipelineResult<Option<Job>> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.begin_processing()?;
                Ok(Some(job.clone()))
            }
            Some(_) => Ok(None),
            None => Err(PipelineError::JobNotFound { id: id.to_string() }),
        }
    }

    async fn next_pending(&self) -> PipelineResult<Option<String>> {
        let jobs = self.jobs.read().await;
        let next = jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .min_by(|a, b| {
                // highest priority first, then submission order
                b.request
                    .priority
                    .cmp(&a.request.priority)
                    .then(a.created_at.cmp(&b.created_at))
            })
            .map(|job| job.id.clone());
        Ok(next)
    }

    async fn list(&self, filter: Option<JobStatus>, limit: usize) -> PipelineResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| filter.map_or(true, |status| job.status == status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::model::{ConversionRequest, Priority, SourceRef};

    fn job_with_priority(priority: Priority) -> Job {
        let mut request =
            ConversionRequest::new(SourceRef::Upload("in.mov".to_string()), "mp4");
        request.priority = priority;
        Job::new(request)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryJobStore::new();
        let job = job_with_priority(Priority::Normal);
        let id = job.id.clone();

        store.insert(job).await.unwrap();
        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.status, JobStatus::Pending);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryJobStore::new();
        let job = job_with_priority(Priority::Normal);
        store.insert(job.clone()).await.unwrap();
        assert!(store.insert(job).await.is_err());
    }

    #[tokio::test]
    async fn test_claim_is_single_winner() {
        let store = Arc::new(MemoryJobStore::new());
        let job = job_with_priority(Priority::Normal);
        let id = job.id.clone();
        store.insert(job).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(
                async move { store.claim(&id).await.unwrap() },
            ));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let claimed = store.get(&id).await.unwrap().unwrap();
        assert_eq!(claimed.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_next_pending_prefers_priority_then_fifo() {
        let store = MemoryJobStore::new();

        let first_normal = job_with_priority(Priority::Normal);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second_normal = job_with_priority(Priority::Normal);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let high = job_with_priority(Priority::High);

        let first_id = first_normal.id.clone();
        let high_id = high.id.clone();
        store.insert(first_normal).await.unwrap();
        store.insert(second_normal).await.unwrap();
        store.insert(high).await.unwrap();

        // high priority wins despite later submission
        assert_eq!(store.next_pending().await.unwrap().unwrap(), high_id);
        store.claim(&high_id).await.unwrap().unwrap();

        // then FIFO among equal priorities
        assert_eq!(store.next_pending().await.unwrap().unwrap(), first_id);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first_and_filtered() {
        let store = MemoryJobStore::new();
        let older = job_with_priority(Priority::Normal);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let newer = job_with_priority(Priority::Normal);

        let older_id = older.id.clone();
        let newer_id = newer.id.clone();
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let all = store.list(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer_id);
        assert_eq!(all[1].id, older_id);

        store.claim(&older_id).await.unwrap().unwrap();
        let pending = store.list(Some(JobStatus::Pending), 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, newer_id);

        let limited = store.list(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
