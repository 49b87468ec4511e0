//! Submit command handler.
//!
//! Enqueues a web search without waiting for it.

use crate::services;
use clap::Args;
use wayfinder_core::{config::AppConfig, AppResult};
use wayfinder_pipeline::SearchRequest;

/// Queue a web search for the worker pool
#[derive(Args, Debug)]
pub struct SubmitCommand {
    /// Search query
    pub query: String,

    /// Number of snippets to keep (default: search.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Requesting user, stored with the result
    #[arg(long)]
    pub user_id: Option<String>,

    /// Conversation session, stored with the result
    #[arg(long)]
    pub session_id: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SubmitCommand {
    fn search_request(&self, config: &AppConfig) -> SearchRequest {
        let mut request = SearchRequest::new(self.query.clone())
            .with_top_k(self.top_k.unwrap_or(config.search.top_k));
        if let Some(user_id) = &self.user_id {
            request = request.with_user_id(user_id.clone());
        }
        if let Some(session_id) = &self.session_id {
            request = request.with_session_id(session_id.clone());
        }
        request
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing submit command");

        let queue = services::open_queue(config)?;
        let pipeline = services::pipeline(config, queue);
        let job_id = pipeline.submit_request(self.search_request(config))?;

        if self.json {
            let output = serde_json::json!({ "jobId": job_id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", job_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults_top_k() {
        let cmd = SubmitCommand {
            query: "rust".to_string(),
            top_k: None,
            user_id: Some("u-1".to_string()),
            session_id: None,
            json: false,
        };

        let request = cmd.search_request(&AppConfig::default());
        assert_eq!(request.top_k, Some(5));
        assert_eq!(request.user_id.as_deref(), Some("u-1"));
    }
}
