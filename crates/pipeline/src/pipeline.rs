//! Submission and retrieval side of the web search pipeline.

use crate::clock::Clock;
use crate::queue::JobQueue;
use crate::types::{
    DeadLetter, JobId, JobStatus, QueueStats, SearchJob, SearchJobFailed, SearchResult,
    DEFAULT_TOP_K,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wayfinder_core::{AppError, AppResult};

/// A web search to be executed asynchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<u32>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            user_id: None,
            session_id: None,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Why waiting for a job did not produce a result.
#[derive(Debug, Error)]
pub enum AwaitError {
    #[error(transparent)]
    Failed(#[from] SearchJobFailed),

    #[error("search job {job_id} did not complete within {waited:?}")]
    TimedOut { job_id: JobId, waited: Duration },

    #[error("search job {0} is unknown")]
    Unknown(JobId),

    #[error(transparent)]
    Queue(#[from] AppError),
}

impl From<AwaitError> for AppError {
    fn from(err: AwaitError) -> Self {
        match err {
            AwaitError::Queue(e) => e,
            other => AppError::Search(other.to_string()),
        }
    }
}

/// Front door of the asynchronous search pipeline.
///
/// Submitting only enqueues; results become available once a worker has
/// processed the job.
#[derive(Clone)]
pub struct WebSearchPipeline {
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    default_top_k: u32,
}

impl WebSearchPipeline {
    pub fn new(queue: Arc<dyn JobQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            queue,
            clock,
            poll_interval: Duration::from_millis(500),
            default_top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_default_top_k(mut self, top_k: u32) -> Self {
        self.default_top_k = top_k.max(1);
        self
    }

    /// Enqueue a search for `query` and return its job id.
    pub fn submit(&self, query: &str) -> AppResult<JobId> {
        self.submit_request(SearchRequest::new(query))
    }

    /// Enqueue a fully specified search request.
    pub fn submit_request(&self, request: SearchRequest) -> AppResult<JobId> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AppError::Search("Search query must not be empty".to_string()));
        }

        let mut job = SearchJob::new(query, self.clock.now())
            .with_top_k(request.top_k.unwrap_or(self.default_top_k));
        if let Some(user_id) = request.user_id {
            job = job.with_user_id(user_id);
        }
        if let Some(session_id) = request.session_id {
            job = job.with_session_id(session_id);
        }

        self.queue.enqueue(&job)?;
        tracing::info!("Submitted search job {}", job.id);
        Ok(job.id)
    }

    pub fn status(&self, job_id: &JobId) -> AppResult<JobStatus> {
        self.queue.status(job_id)
    }

    pub fn stats(&self) -> AppResult<QueueStats> {
        self.queue.stats(self.clock.now())
    }

    pub fn dead_letters(&self) -> AppResult<Vec<DeadLetter>> {
        self.queue.dead_letters()
    }

    /// Remove stored results and dead letters older than `age`.
    pub fn prune(&self, age: Duration) -> AppResult<u64> {
        let age = chrono::Duration::from_std(age)
            .map_err(|e| AppError::Queue(format!("Invalid prune age: {}", e)))?;
        self.queue.prune(self.clock.now() - age)
    }

    /// Poll until the job completes, fails, or `timeout` elapses.
    pub async fn wait_for(
        &self,
        job_id: &JobId,
        timeout: Duration,
    ) -> Result<SearchResult, AwaitError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.queue.status(job_id)? {
                JobStatus::Completed(result) => return Ok(result),
                JobStatus::Failed { reason } => {
                    return Err(AwaitError::Failed(SearchJobFailed {
                        job_id: job_id.clone(),
                        reason,
                    }))
                }
                JobStatus::Unknown => return Err(AwaitError::Unknown(job_id.clone())),
                JobStatus::Pending { .. } => {}
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(AwaitError::TimedOut {
                    job_id: job_id.clone(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::queue::QueuePolicy;
    use crate::sqlite::SqliteJobQueue;

    fn pipeline() -> WebSearchPipeline {
        let queue = SqliteJobQueue::open_in_memory(QueuePolicy::default()).unwrap();
        WebSearchPipeline::new(Arc::new(queue), Arc::new(SystemClock))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_submit_enqueues_pending_job() {
        let pipeline = pipeline();
        let id = pipeline.submit("rust async").unwrap();

        assert_eq!(pipeline.status(&id).unwrap(), JobStatus::Pending { attempt: 1 });
        assert_eq!(pipeline.stats().unwrap().ready, 1);
    }

    #[test]
    fn test_submit_rejects_empty_query() {
        let err = pipeline().submit("   ").unwrap_err();
        assert!(matches!(err, AppError::Search(_)));
    }

    #[tokio::test]
    async fn test_wait_for_times_out_on_pending_job() {
        let pipeline = pipeline();
        let id = pipeline.submit("rust").unwrap();

        let err = pipeline
            .wait_for(&id, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, AwaitError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_wait_for_unknown_job() {
        let err = pipeline()
            .wait_for(&JobId::from("nope"), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, AwaitError::Unknown(_)));
    }
}
