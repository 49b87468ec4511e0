//! Queue command handler.
//!
//! Inspection and housekeeping for the web search queue.

use crate::services;
use clap::{Args, Subcommand};
use std::time::Duration;
use wayfinder_core::{config::AppConfig, AppResult};
use wayfinder_pipeline::{JobId, JobStatus};

/// Inspect the web search queue
#[derive(Args, Debug)]
pub struct QueueCommand {
    #[command(subcommand)]
    pub action: QueueAction,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// Show job counts
    Stats,

    /// List dead-lettered jobs
    DeadLetters,

    /// Show the state of one job
    Status {
        /// Job id printed by `submit`
        job_id: String,
    },

    /// Delete stored results and dead letters
    Prune {
        /// Keep records younger than this many hours
        #[arg(long, default_value = "168")]
        older_than_hours: u64,
    },
}

impl QueueCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing queue command");

        let queue = services::open_queue(config)?;
        let pipeline = services::pipeline(config, queue);

        match &self.action {
            QueueAction::Stats => {
                let stats = pipeline.stats()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("Ready:         {}", stats.ready);
                    println!("In flight:     {}", stats.in_flight);
                    println!("Completed:     {}", stats.completed);
                    println!("Dead-lettered: {}", stats.dead_lettered);
                }
            }
            QueueAction::DeadLetters => {
                let letters = pipeline.dead_letters()?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&letters)?);
                } else if letters.is_empty() {
                    println!("No dead-lettered jobs");
                } else {
                    for letter in &letters {
                        println!(
                            "{}  {}  attempt {}  {:?}: {}",
                            letter.failed_at.to_rfc3339(),
                            letter.job.id,
                            letter.job.attempt,
                            letter.job.query,
                            letter.reason
                        );
                    }
                }
            }
            QueueAction::Status { job_id } => {
                let status = pipeline.status(&JobId::from(job_id.as_str()))?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&status_json(job_id, &status))?);
                } else {
                    println!("{}", describe_status(&status));
                }
            }
            QueueAction::Prune { older_than_hours } => {
                let removed = pipeline.prune(Duration::from_secs(older_than_hours * 3600))?;
                if self.json {
                    println!("{}", serde_json::json!({ "removed": removed }));
                } else {
                    println!("Removed {} records", removed);
                }
            }
        }

        Ok(())
    }
}

fn describe_status(status: &JobStatus) -> String {
    match status {
        JobStatus::Pending { attempt } => format!("pending (attempt {})", attempt),
        JobStatus::Completed(result) => format!(
            "completed at {} with {} snippets",
            result.fetched_at.to_rfc3339(),
            result.snippets.len()
        ),
        JobStatus::Failed { reason } => format!("failed: {}", reason),
        JobStatus::Unknown => "unknown".to_string(),
    }
}

fn status_json(job_id: &str, status: &JobStatus) -> serde_json::Value {
    match status {
        JobStatus::Pending { attempt } => {
            serde_json::json!({ "jobId": job_id, "state": "pending", "attempt": attempt })
        }
        JobStatus::Completed(result) => {
            serde_json::json!({ "jobId": job_id, "state": "completed", "result": result })
        }
        JobStatus::Failed { reason } => {
            serde_json::json!({ "jobId": job_id, "state": "failed", "reason": reason })
        }
        JobStatus::Unknown => serde_json::json!({ "jobId": job_id, "state": "unknown" }),
    }
}
