//! Search job and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wayfinder_core::AppError;
use wayfinder_search::Snippet;

/// Default number of snippets kept per job.
pub const DEFAULT_TOP_K: u32 = 5;

/// Unique identifier of a search job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A queued web search request.
///
/// Owned by the queue from enqueue until it is acknowledged or dead-lettered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJob {
    pub id: JobId,

    pub query: String,

    pub submitted_at: DateTime<Utc>,

    /// Delivery attempt, starting at 1 and incremented on each redelivery
    pub attempt: u32,

    /// The job cannot be claimed before this instant
    pub visible_after: DateTime<Utc>,

    /// Maximum number of snippets to keep
    pub top_k: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SearchJob {
    /// Create a job that is immediately claimable.
    pub fn new(query: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: JobId::generate(),
            query: query.into(),
            submitted_at: now,
            attempt: 1,
            visible_after: now,
            top_k: DEFAULT_TOP_K,
            user_id: None,
            session_id: None,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k.max(1);
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

/// Output of a successfully completed job. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub job_id: JobId,

    /// Ranked snippets, best first
    pub snippets: Vec<Snippet>,

    pub fetched_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SearchResult {
    /// Build the result for `job`, keeping at most `job.top_k` snippets.
    pub fn for_job(job: &SearchJob, mut snippets: Vec<Snippet>, fetched_at: DateTime<Utc>) -> Self {
        snippets.truncate(job.top_k as usize);
        Self {
            job_id: job.id.clone(),
            snippets,
            fetched_at,
            user_id: job.user_id.clone(),
            session_id: job.session_id.clone(),
        }
    }
}

/// A job handed to one worker for the duration of a visibility window.
///
/// The receipt identifies this particular delivery; acknowledging or
/// dead-lettering with an outdated receipt is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedJob {
    pub job: SearchJob,
    pub receipt: String,
}

/// A job moved out of the active queue for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub job: SearchJob,
    pub reason: String,
    /// Name of the dead-letter destination
    pub destination: String,
    pub failed_at: DateTime<Utc>,
}

/// What a claim produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A job ready to be executed
    Job(ClaimedJob),
    /// A job that exhausted its deliveries and was dead-lettered by the claim
    DeadLettered(DeadLetter),
}

/// Externally visible state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still in the queue; `attempt` is the latest delivery attempt
    Pending { attempt: u32 },
    Completed(SearchResult),
    Failed { reason: String },
    /// Never submitted, or pruned
    Unknown,
}

/// Queue counters at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Jobs claimable now
    pub ready: u64,
    /// Jobs hidden inside a visibility window
    pub in_flight: u64,
    pub completed: u64,
    pub dead_lettered: u64,
}

/// Terminal failure of a single job. Never fatal to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("search job {job_id} failed: {reason}")]
pub struct SearchJobFailed {
    pub job_id: JobId,
    pub reason: String,
}

impl From<SearchJobFailed> for AppError {
    fn from(err: SearchJobFailed) -> Self {
        AppError::Search(err.to_string())
    }
}

impl From<&DeadLetter> for SearchJobFailed {
    fn from(letter: &DeadLetter) -> Self {
        Self {
            job_id: letter.job.id.clone(),
            reason: letter.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_first_attempt_and_visible() {
        let now = Utc::now();
        let job = SearchJob::new("weather today", now);

        assert_eq!(job.attempt, 1);
        assert_eq!(job.visible_after, now);
        assert_eq!(job.submitted_at, now);
        assert_eq!(job.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_job_ids_are_unique() {
        let now = Utc::now();
        assert_ne!(SearchJob::new("a", now).id, SearchJob::new("a", now).id);
    }

    #[test]
    fn test_result_truncates_to_top_k() {
        let job = SearchJob::new("rust", Utc::now()).with_top_k(2);
        let snippets = (0..5)
            .map(|i| Snippet::new(format!("t{}", i), format!("https://e.com/{}", i), ""))
            .collect();

        let result = SearchResult::for_job(&job, snippets, Utc::now());
        assert_eq!(result.snippets.len(), 2);
        assert_eq!(result.snippets[0].title, "t0");
        assert_eq!(result.job_id, job.id);
    }

    #[test]
    fn test_job_serialization_is_camel_case() {
        let job = SearchJob::new("rust", Utc::now()).with_session_id("s-1");
        let json = serde_json::to_value(&job).unwrap();

        assert!(json.get("submittedAt").is_some());
        assert!(json.get("visibleAfter").is_some());
        assert_eq!(json["sessionId"], "s-1");
        assert!(json.get("userId").is_none());

        let back: SearchJob = serde_json::from_value(json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_job_failed_display() {
        let err = SearchJobFailed {
            job_id: JobId::from("job-1"),
            reason: "malformed query".to_string(),
        };
        assert_eq!(err.to_string(), "search job job-1 failed: malformed query");
    }
}
