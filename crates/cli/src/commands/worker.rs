//! Worker command handler.
//!
//! Runs the search worker pool against the workspace queue.

use crate::services;
use clap::Args;
use wayfinder_core::{config::AppConfig, AppError, AppResult};
use wayfinder_pipeline::{JobOutcome, WorkerPool};

/// Run search workers until interrupted
#[derive(Args, Debug)]
pub struct WorkerCommand {
    /// Number of concurrent workers (default: pipeline.workers)
    #[arg(short = 'n', long)]
    pub workers: Option<usize>,

    /// Process at most one job and exit
    #[arg(long)]
    pub once: bool,
}

impl WorkerCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing worker command");

        let queue = services::open_queue(config)?;
        let worker = services::worker(config, queue)?;

        if self.once {
            match worker.process_next().await? {
                None => println!("Queue is empty"),
                Some(outcome) => println!("{}", describe(&outcome)),
            }
            return Ok(());
        }

        let size = self.workers.unwrap_or(config.pipeline.workers);
        let pool = WorkerPool::spawn(size, worker);
        eprintln!("Running {} workers, press Ctrl-C to stop", pool.size());

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::Other(format!("Failed to listen for Ctrl-C: {}", e)))?;

        tracing::info!("Shutdown requested");
        pool.shutdown().await;
        Ok(())
    }
}

fn describe(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed(id) => format!("Job {} completed", id),
        JobOutcome::Retrying { job_id, reason } => {
            format!("Job {} will be retried: {}", job_id, reason)
        }
        JobOutcome::Failed(failed) => failed.to_string(),
        JobOutcome::Superseded(id) => format!("Job {} was picked up by another worker", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_pipeline::{JobId, SearchJobFailed};

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(
            describe(&JobOutcome::Completed(JobId::from("j1"))),
            "Job j1 completed"
        );
        assert_eq!(
            describe(&JobOutcome::Failed(SearchJobFailed {
                job_id: JobId::from("j2"),
                reason: "bad query".to_string(),
            })),
            "search job j2 failed: bad query"
        );
    }
}
