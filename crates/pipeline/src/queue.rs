//! Job queue abstraction.
//!
//! Defines the at-least-once delivery contract the worker relies on. All job
//! state transitions happen inside the queue; callers never mutate a job.

use crate::types::{ClaimedJob, DeadLetter, Delivery, JobId, JobStatus, QueueStats, SearchJob, SearchResult};
use chrono::{DateTime, Utc};
use std::time::Duration;
use wayfinder_core::config::PipelineConfig;
use wayfinder_core::AppResult;

/// Redelivery policy enforced by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePolicy {
    /// Deliveries allowed before a job is dead-lettered
    pub max_attempts: u32,

    /// Name recorded on dead-lettered jobs
    pub dead_letter_name: String,
}

impl QueuePolicy {
    pub fn new(max_attempts: u32, dead_letter_name: impl Into<String>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            dead_letter_name: dead_letter_name.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_attempts, config.dead_letter_name.clone())
    }
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Trait for durable job queue backends.
///
/// Implementations must make each operation atomic with respect to every
/// other worker sharing the queue:
/// - `claim` hands a job to exactly one caller per visibility window
/// - a job whose window lapses without acknowledgement becomes claimable again
/// - a job claimed more than `max_attempts` times is dead-lettered, not delivered
/// - only `acknowledge` and `dead_letter` remove a job
pub trait JobQueue: Send + Sync {
    /// Add a job to the queue.
    fn enqueue(&self, job: &SearchJob) -> AppResult<()>;

    /// Claim the oldest job visible at `now`, hiding it for `visibility`.
    ///
    /// Returns `None` when nothing is claimable.
    fn claim(&self, now: DateTime<Utc>, visibility: Duration) -> AppResult<Option<Delivery>>;

    /// Store the result and delete the job.
    ///
    /// Returns `false` when the claim's receipt is no longer current.
    fn acknowledge(&self, claim: &ClaimedJob, result: &SearchResult) -> AppResult<bool>;

    /// Move a claimed job to the dead-letter destination.
    ///
    /// Returns `false` when the claim's receipt is no longer current.
    fn dead_letter(&self, claim: &ClaimedJob, reason: &str, now: DateTime<Utc>) -> AppResult<bool>;

    /// Look up a job by id across the active queue, results and dead letters.
    fn status(&self, job_id: &JobId) -> AppResult<JobStatus>;

    /// Count jobs by state as seen at `now`.
    fn stats(&self, now: DateTime<Utc>) -> AppResult<QueueStats>;

    /// List dead-lettered jobs, oldest first.
    fn dead_letters(&self) -> AppResult<Vec<DeadLetter>>;

    /// Drop stored results and dead letters recorded before `before`.
    ///
    /// Returns the number of records removed.
    fn prune(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
