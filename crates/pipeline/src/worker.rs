//! Queue consumer that executes web search jobs.

use crate::clock::Clock;
use crate::queue::JobQueue;
use crate::types::{ClaimedJob, Delivery, JobId, SearchJobFailed, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wayfinder_core::{AppConfig, AppResult};
use wayfinder_search::{ProviderError, SearchProviderClient, SecretStore};

/// Timing and credential settings for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// How long a claimed job stays hidden from other workers
    pub visibility_timeout: Duration,

    /// Upper bound on a single provider call
    pub call_timeout: Duration,

    /// Idle wait between claims when the queue is empty
    pub poll_interval: Duration,

    /// Logical name of the provider API key in the secret store
    pub secret_name: String,
}

impl WorkerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            visibility_timeout: config.pipeline.visibility_timeout(),
            call_timeout: config.search.timeout(),
            poll_interval: config.pipeline.poll_interval(),
            secret_name: config.search.secret_name.clone(),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// What happened to the job a worker picked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Result stored and job removed
    Completed(JobId),

    /// Attempt failed transiently; the job reappears when its window lapses
    Retrying { job_id: JobId, reason: String },

    /// Job dead-lettered, either now or by the claim itself
    Failed(SearchJobFailed),

    /// Another delivery of the same job holds the current receipt
    Superseded(JobId),
}

/// Executes jobs claimed from the queue against one search provider.
#[derive(Clone)]
pub struct SearchWorker {
    name: String,
    queue: Arc<dyn JobQueue>,
    client: Arc<dyn SearchProviderClient>,
    secrets: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
}

impl SearchWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        client: Arc<dyn SearchProviderClient>,
        secrets: Arc<dyn SecretStore>,
        clock: Arc<dyn Clock>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            name: "worker".to_string(),
            queue,
            client,
            secrets,
            clock,
            settings,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Claim and execute at most one job.
    ///
    /// Returns `None` when nothing was claimable. Only queue failures are
    /// reported as errors; job failures are reported through [`JobOutcome`].
    pub async fn process_next(&self) -> AppResult<Option<JobOutcome>> {
        let delivery = self
            .queue
            .claim(self.clock.now(), self.settings.visibility_timeout)?;

        match delivery {
            None => Ok(None),
            Some(Delivery::DeadLettered(letter)) => {
                let failed = SearchJobFailed::from(&letter);
                tracing::warn!("[{}] {}", self.name, failed);
                Ok(Some(JobOutcome::Failed(failed)))
            }
            Some(Delivery::Job(claim)) => self.execute(claim).await.map(Some),
        }
    }

    async fn execute(&self, claim: ClaimedJob) -> AppResult<JobOutcome> {
        let job_id = claim.job.id.clone();
        tracing::info!(
            "[{}] Running job {} (attempt {}) via {}",
            self.name,
            job_id,
            claim.job.attempt,
            self.client.provider_name()
        );

        let credential = match self.secrets.get_secret(&self.settings.secret_name).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!("[{}] Credential lookup failed for job {}: {}", self.name, job_id, e);
                return Ok(JobOutcome::Retrying {
                    job_id,
                    reason: e.to_string(),
                });
            }
        };

        let search = self.client
            .search(&claim.job.query, &credential, claim.job.top_k);
        let response = match tokio::time::timeout(self.settings.call_timeout, search).await {
            Ok(response) => response,
            Err(_) => Err(ProviderError::Transient(format!(
                "{} call timed out after {:?}",
                self.client.provider_name(),
                self.settings.call_timeout
            ))),
        };

        match response {
            Ok(snippets) => {
                let result = SearchResult::for_job(&claim.job, snippets, self.clock.now());
                let count = result.snippets.len();
                if self.queue.acknowledge(&claim, &result)? {
                    tracing::info!("[{}] Job {} completed with {} snippets", self.name, job_id, count);
                    Ok(JobOutcome::Completed(job_id))
                } else {
                    tracing::warn!("[{}] Job {} was redelivered before completion", self.name, job_id);
                    Ok(JobOutcome::Superseded(job_id))
                }
            }
            Err(ProviderError::Transient(reason)) => {
                tracing::warn!(
                    "[{}] Job {} attempt {} failed, will retry: {}",
                    self.name,
                    job_id,
                    claim.job.attempt,
                    reason
                );
                Ok(JobOutcome::Retrying { job_id, reason })
            }
            Err(ProviderError::Permanent(reason)) => {
                if self.queue.dead_letter(&claim, &reason, self.clock.now())? {
                    let failed = SearchJobFailed { job_id, reason };
                    tracing::error!("[{}] {}", self.name, failed);
                    Ok(JobOutcome::Failed(failed))
                } else {
                    tracing::warn!("[{}] Job {} was redelivered before failing", self.name, job_id);
                    Ok(JobOutcome::Superseded(job_id))
                }
            }
        }
    }

    /// Process jobs until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Queue errors are logged and retried after the poll interval.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("[{}] Worker started", self.name);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let idle = match self.process_next().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    tracing::error!("[{}] Queue error: {}", self.name, e);
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("[{}] Worker stopped", self.name);
    }
}
